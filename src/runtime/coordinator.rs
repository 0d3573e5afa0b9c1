use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::{debug, info, instrument, warn};

use crate::agent::{
    Agent, AgentCell, AgentId, AgentRegistry, AgentRole, GenericAgent, Message, MessageKind,
};
use crate::config::{ExecutionMode, OrchestrationConfig, RoleBinding};
use crate::error::{AgentMeshError, Result};
use crate::state::{RouteOutcome, SystemState};

use super::processor::{drain_and_process, process_batch};
use super::types::{DrainOutcome, RunLog};

/// 协调者：持有注册表、负责路由并按轮次驱动执行
///
/// 注册只在装配阶段进行（`&mut self`）；编排期间注册表只读。
pub struct Coordinator {
    bindings: RoleBinding,
    config: OrchestrationConfig,
    registry: AgentRegistry,
    own: AgentCell,
}

impl Coordinator {
    pub fn new(bindings: RoleBinding) -> Self {
        let own = AgentCell::with_role(
            bindings.coordinator.clone(),
            AgentRole::Coordinator,
            Arc::new(GenericAgent::with_role(AgentRole::Coordinator)),
        );
        Self {
            bindings,
            config: OrchestrationConfig::default(),
            registry: AgentRegistry::new(),
            own,
        }
    }

    pub fn with_config(mut self, config: OrchestrationConfig) -> Self {
        self.config = config;
        self
    }

    /// 替换协调者处理自身收件箱时使用的 handler
    ///
    /// 已有的知识和待处理消息保留。
    pub fn with_handler(mut self, handler: Arc<dyn Agent>) -> Self {
        let pending = self.own.mailbox().drain();
        let knowledge = self.own.knowledge().snapshot();
        let own = AgentCell::with_role(
            self.bindings.coordinator.clone(),
            AgentRole::Coordinator,
            handler,
        );
        for message in pending {
            own.mailbox().enqueue(message);
        }
        for (key, value) in knowledge {
            own.knowledge().set(&key, value);
        }
        self.own = own;
        self
    }

    pub fn id(&self) -> &AgentId {
        self.own.id()
    }

    pub fn bindings(&self) -> &RoleBinding {
        &self.bindings
    }

    pub fn config(&self) -> &OrchestrationConfig {
        &self.config
    }

    pub fn register(&mut self, id: impl Into<AgentId>, agent: Arc<dyn Agent>) -> Result<()> {
        let id = id.into();
        if id == *self.own.id() {
            return Err(AgentMeshError::ReservedAgentId(id));
        }
        debug!(agent = %id, role = %agent.role(), "registering agent");
        self.registry.register(AgentCell::new(id, agent))
    }

    pub fn agents(&self) -> impl Iterator<Item = &AgentCell> {
        self.registry.iter()
    }

    /// 查找已注册的 Agent，也可以查到协调者自身
    pub fn agent(&self, id: &str) -> Option<&AgentCell> {
        if self.own.id() == id {
            Some(&self.own)
        } else {
            self.registry.get(id)
        }
    }

    pub fn route(&self, message: Message) -> RouteOutcome {
        match self.agent(message.receiver().as_str()) {
            Some(cell) => {
                debug!(
                    from = %message.sender(),
                    to = %message.receiver(),
                    kind = %message.kind(),
                    "message routed"
                );
                cell.mailbox().enqueue(message);
                RouteOutcome::Delivered
            }
            None => {
                warn!(
                    from = %message.sender(),
                    to = %message.receiver(),
                    kind = %message.kind(),
                    "unknown receiver, message dropped"
                );
                RouteOutcome::Dropped
            }
        }
    }

    pub fn route_strict(&self, message: Message) -> Result<()> {
        let receiver = message.receiver().clone();
        match self.route(message) {
            RouteOutcome::Delivered => Ok(()),
            RouteOutcome::Dropped => Err(AgentMeshError::UnknownReceiver(receiver)),
        }
    }

    /// 处理单个收件箱，回复不做路由
    pub async fn drain_agent(&self, id: &str, round: u32) -> Result<DrainOutcome> {
        let cell = self
            .agent(id)
            .ok_or_else(|| AgentMeshError::AgentNotRegistered(id.to_string()))?;
        Ok(drain_and_process(cell, round, self.config.handler_timeout()).await)
    }

    pub async fn orchestrate(&self, task: &str) -> SystemState {
        self.orchestrate_rounds(task, self.config.rounds).await
    }

    #[instrument(skip(self), fields(coordinator = %self.own.id()))]
    pub async fn orchestrate_rounds(&self, task: &str, rounds: u32) -> SystemState {
        info!(agents = self.registry.len(), "coordinating task");
        let mut log = RunLog::default();

        let seed = Message::new(
            self.own.id().clone(),
            self.bindings.analyst.clone(),
            task,
            MessageKind::DataRequest,
        );
        self.route_logged(seed, 0, &mut log);

        for round in 1..=rounds {
            info!(round, "round started");
            match self.config.mode {
                ExecutionMode::Sequential => self.run_sequential_round(round, &mut log).await,
                ExecutionMode::Concurrent { max_concurrency } => {
                    self.run_concurrent_round(round, max_concurrency, &mut log)
                        .await
                }
            }

            let own = drain_and_process(&self.own, round, self.config.handler_timeout()).await;
            self.absorb(own, round, &mut log);
        }

        let state = self.snapshot(task, rounds, log);
        info!(
            routed = state.history.len(),
            dropped = state.dropped_count(),
            failures = state.failures.len(),
            "orchestration finished"
        );
        state
    }

    async fn run_sequential_round(&self, round: u32, log: &mut RunLog) {
        let timeout = self.config.handler_timeout();
        for cell in self.registry.iter() {
            let outcome = drain_and_process(cell, round, timeout).await;
            self.absorb(outcome, round, log);
        }
    }

    /// 先快照所有收件箱并发处理，全部完成后按注册顺序路由
    async fn run_concurrent_round(&self, round: u32, max_concurrency: usize, log: &mut RunLog) {
        let timeout = self.config.handler_timeout();
        let batches: Vec<_> = self
            .registry
            .iter()
            .map(|cell| (cell, cell.mailbox().drain()))
            .collect();

        let outcomes: Vec<DrainOutcome> = stream::iter(batches)
            .map(|(cell, batch)| process_batch(cell, batch, round, timeout))
            .buffered(max_concurrency.max(1))
            .collect()
            .await;

        for outcome in outcomes {
            self.absorb(outcome, round, log);
        }
    }

    fn absorb(&self, outcome: DrainOutcome, round: u32, log: &mut RunLog) {
        log.failures.extend(outcome.failures);
        for response in outcome.responses {
            self.route_logged(response, round, log);
        }
    }

    fn route_logged(&self, message: Message, round: u32, log: &mut RunLog) {
        let outcome = self.route(message.clone());
        log.record_route(round, message, outcome);
    }

    fn snapshot(&self, task: &str, rounds: u32, log: RunLog) -> SystemState {
        let mut agents: Vec<_> = self.registry.iter().map(AgentCell::snapshot).collect();
        agents.push(self.own.snapshot());
        SystemState {
            task: task.to_string(),
            rounds,
            agents,
            history: log.history,
            failures: log.failures,
        }
    }

    /// 不执行任何轮次，直接返回当前状态
    pub fn state(&self, task: &str) -> SystemState {
        self.snapshot(task, 0, RunLog::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinator_id_is_reserved() {
        let mut coordinator = Coordinator::new(RoleBinding::default());
        let err = coordinator
            .register("coordinator", Arc::new(GenericAgent::new()))
            .unwrap_err();
        assert!(matches!(err, AgentMeshError::ReservedAgentId(_)));
    }

    #[test]
    fn route_to_coordinator_lands_in_own_mailbox() {
        let coordinator = Coordinator::new(RoleBinding::default());
        let outcome = coordinator.route(Message::new(
            "decision_maker",
            "coordinator",
            "Decision: Reduce costs",
            MessageKind::Decision,
        ));
        assert_eq!(outcome, RouteOutcome::Delivered);
        assert_eq!(coordinator.agent("coordinator").unwrap().mailbox().len(), 1);
    }

    #[test]
    fn route_strict_surfaces_unknown_receivers() {
        let coordinator = Coordinator::new(RoleBinding::default());
        let err = coordinator
            .route_strict(Message::info("coordinator", "ghost", "hello"))
            .unwrap_err();
        assert!(matches!(err, AgentMeshError::UnknownReceiver(id) if id == "ghost"));
    }

    #[test]
    fn with_handler_keeps_pending_messages() {
        let coordinator = Coordinator::new(RoleBinding::default());
        coordinator.route(Message::info("x", "coordinator", "early"));
        let coordinator = coordinator.with_handler(Arc::new(GenericAgent::new()));
        let own = coordinator.agent("coordinator").unwrap();
        assert_eq!(own.mailbox().len(), 1);
        assert_eq!(own.role(), AgentRole::Coordinator);
    }
}
