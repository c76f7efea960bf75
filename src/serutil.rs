use serde::{ser::SerializeSeq, Serialize, Serializer};

/// Implement Display for a given class by formatting it as pretty-printed JSON.
#[macro_export]
macro_rules! display_json {
    ($cls:ident) => {
        impl std::fmt::Display for $cls {
            fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                let buf = Vec::new();
                let serde_formatter = ::serde_json::ser::PrettyFormatter::with_indent(b"    ");
                let mut ser = ::serde_json::Serializer::with_formatter(buf, serde_formatter);
                match self.serialize(&mut ser) {
                    Ok(()) => (),
                    Err(e) => {
                        ::log::error!("Failed to serialize: {}", e);
                        return Err(::std::fmt::Error {});
                    }
                };
                match std::str::from_utf8(&ser.into_inner()) {
                    Ok(s) => write!(f, "{}", s),
                    Err(e) => {
                        ::log::error!("JSON serialization contained non-UTF-8 characters: {}", e);
                        Err(::std::fmt::Error {})
                    }
                }
            }
        }
    };
}

/// Wire form of the `Action` and `Resource` elements: a single element is
/// emitted as a bare string, anything else as a JSON array.
pub(crate) struct ScalarOrList<'a>(pub &'a [String]);

impl Serialize for ScalarOrList<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.0.len() == 1 {
            serializer.serialize_str(&self.0[0])
        } else {
            let mut seq = serializer.serialize_seq(Some(self.0.len()))?;
            for el in self.0 {
                seq.serialize_element(el)?;
            }
            seq.end()
        }
    }
}

#[cfg(test)]
mod tests {
    use {crate::serutil::ScalarOrList, pretty_assertions::assert_eq};

    #[test_log::test]
    fn test_scalar_when_singular() {
        let one = vec!["widgets:CreateWidget".to_string()];
        assert_eq!(serde_json::to_string(&ScalarOrList(&one)).unwrap(), r#""widgets:CreateWidget""#);
    }

    #[test_log::test]
    fn test_list_when_plural() {
        let two = vec!["widgets:CreateWidget".to_string(), "widgets:DeleteWidget".to_string()];
        assert_eq!(
            serde_json::to_string(&ScalarOrList(&two)).unwrap(),
            r#"["widgets:CreateWidget","widgets:DeleteWidget"]"#
        );

        let none: Vec<String> = Vec::new();
        assert_eq!(serde_json::to_string(&ScalarOrList(&none)).unwrap(), "[]");
    }
}
