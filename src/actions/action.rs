//! Compiled actions.

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

use crate::actions::key::ActionKey;
use crate::actions::schema::ArgumentSchema;
use crate::actions::types::{AbiFunction, ContractRef, StateMutability};
use crate::pipeline::envelope::ResultEnvelope;
use crate::pipeline::executor::{ActionExecutor, InvocationContext};

/// One callable contract function.
///
/// Actions are rebuilt on every compile pass and never persisted.
#[derive(Debug, Clone)]
pub struct Action {
    pub key: ActionKey,
    pub contract: Arc<ContractRef>,
    pub function: AbiFunction,
    pub schema: ArgumentSchema,
    pub description: String,
}

impl Action {
    /// Run the full pipeline for this action. Never fails; every outcome is an envelope.
    pub async fn invoke(
        &self,
        executor: &ActionExecutor,
        ctx: &InvocationContext,
        args: &Map<String, Value>,
    ) -> ResultEnvelope {
        executor.invoke_action(self, ctx, args).await
    }

    pub fn descriptor(&self) -> ActionDescriptor {
        ActionDescriptor {
            action_key: self.key.clone(),
            function_name: self.function.name.clone(),
            signature: self.function.signature(),
            state_mutability: self.function.state_mutability,
            description: self.description.clone(),
            schema: self.schema.clone(),
        }
    }
}

/// Serializable view of an action, as listed to callers.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionDescriptor {
    pub action_key: ActionKey,
    pub function_name: String,
    pub signature: String,
    pub state_mutability: StateMutability,
    pub description: String,
    pub schema: ArgumentSchema,
}

/// Compiled actions of one contract, addressable by key.
#[derive(Debug, Clone, Default)]
pub struct ActionSet {
    actions: Vec<Action>,
    index: HashMap<ActionKey, usize>,
}

impl ActionSet {
    pub fn new(actions: Vec<Action>) -> Self {
        let index = actions
            .iter()
            .enumerate()
            .map(|(i, a)| (a.key.clone(), i))
            .collect();
        Self { actions, index }
    }

    pub fn get(&self, key: &ActionKey) -> Option<&Action> {
        self.index.get(key).map(|&i| &self.actions[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Action> {
        self.actions.iter()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn descriptors(&self) -> Vec<ActionDescriptor> {
        self.actions.iter().map(Action::descriptor).collect()
    }
}
