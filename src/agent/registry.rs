use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{AgentMeshError, Result};
use crate::state::{AgentSnapshot, Knowledge};

use super::agent::{Agent, AgentRole};
use super::mailbox::Mailbox;
use super::message::AgentId;

/// 已注册的 Agent：身份、handler、收件箱与知识
pub struct AgentCell {
    id: AgentId,
    role: AgentRole,
    handler: Arc<dyn Agent>,
    mailbox: Mailbox,
    knowledge: Knowledge,
}

impl AgentCell {
    pub fn new(id: AgentId, handler: Arc<dyn Agent>) -> Self {
        let role = handler.role();
        Self::with_role(id, role, handler)
    }

    pub fn with_role(id: AgentId, role: AgentRole, handler: Arc<dyn Agent>) -> Self {
        Self {
            id,
            role,
            handler,
            mailbox: Mailbox::new(),
            knowledge: Knowledge::new(),
        }
    }

    pub fn id(&self) -> &AgentId {
        &self.id
    }

    pub fn role(&self) -> AgentRole {
        self.role
    }

    pub fn handler(&self) -> &Arc<dyn Agent> {
        &self.handler
    }

    pub fn mailbox(&self) -> &Mailbox {
        &self.mailbox
    }

    pub fn knowledge(&self) -> &Knowledge {
        &self.knowledge
    }

    pub fn snapshot(&self) -> AgentSnapshot {
        AgentSnapshot {
            id: self.id.clone(),
            role: self.role,
            knowledge: self.knowledge.snapshot(),
            pending: self.mailbox.snapshot(),
        }
    }
}

/// 按注册顺序保存 Agent，注册顺序即每轮访问顺序
#[derive(Default)]
pub struct AgentRegistry {
    cells: Vec<AgentCell>,
    index: HashMap<AgentId, usize>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self {
            cells: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// 名称已被占用时拒绝注册，保留先注册的 Agent
    pub fn register(&mut self, cell: AgentCell) -> Result<()> {
        if self.contains(cell.id().as_str()) {
            return Err(AgentMeshError::DuplicateAgent(cell.id().clone()));
        }
        self.index.insert(cell.id().clone(), self.cells.len());
        self.cells.push(cell);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&AgentCell> {
        self.index.get(id).map(|&position| &self.cells[position])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AgentCell> {
        self.cells.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = &AgentId> {
        self.cells.iter().map(AgentCell::id)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::builtin::GenericAgent;

    fn cell(name: &str) -> AgentCell {
        AgentCell::new(AgentId::from(name), Arc::new(GenericAgent::new()))
    }

    #[test]
    fn preserves_registration_order() {
        let mut registry = AgentRegistry::new();
        for name in ["zeta", "alpha", "mid"] {
            registry.register(cell(name)).unwrap();
        }
        let ids: Vec<_> = registry.ids().map(AgentId::as_str).collect();
        assert_eq!(ids, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn duplicate_name_is_rejected_and_original_kept() {
        let mut registry = AgentRegistry::new();
        registry.register(cell("analyst")).unwrap();
        registry
            .get("analyst")
            .unwrap()
            .knowledge()
            .set("marker", "original");

        let err = registry.register(cell("analyst")).unwrap_err();
        assert!(matches!(err, AgentMeshError::DuplicateAgent(id) if id == "analyst"));
        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.get("analyst").unwrap().knowledge().get("marker"),
            Some(serde_json::json!("original"))
        );
    }
}
