#![warn(clippy::all)]
pub(crate) mod arn;
pub(crate) mod condition;
pub(crate) mod descriptor;
pub(crate) mod effect;
pub(crate) mod error;
pub(crate) mod operator;
pub(crate) mod statement;

#[macro_use]
pub(crate) mod serutil;

pub use {
    arn::{ArnTemplate, ResourceScope},
    condition::{ConditionKeyFamily, ConditionSet, ConditionSpec, ConditionValue},
    descriptor::{
        AccessLevel, ActionDescriptor, ActionDescriptorBuilder, ActionDescriptorBuilderError, ConditionKeySpec,
        ConditionKeySpecBuilder, ConditionKeySpecBuilderError, ResourceTypeAssociation, ResourceTypeDescriptor,
        ResourceTypeDescriptorBuilder, ResourceTypeDescriptorBuilderError, ServiceSpec,
    },
    effect::Effect,
    error::StanzaError,
    operator::{Operator, SetModifier},
    statement::{Statement, StatementBuilder},
};
