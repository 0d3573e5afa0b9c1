use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::time::{sleep, Duration};

use agentmesh::{
    Agent, AgentContext, AgentId, AgentMeshError, Coordinator, DataAnalyst, DecisionMaker,
    FailureReason, FixedTrendProvider, GenericAgent, Message, MessageKind, OrchestrationConfig,
    RandomTrendProvider, RoleBinding, RouteOutcome, TrendLabel,
};

struct RelayAgent {
    next: Option<AgentId>,
    log: Arc<Mutex<Vec<String>>>,
}

impl RelayAgent {
    fn new(next: Option<&str>, log: Arc<Mutex<Vec<String>>>) -> Self {
        Self {
            next: next.map(AgentId::from),
            log,
        }
    }
}

#[async_trait]
impl Agent for RelayAgent {
    async fn handle(
        &self,
        message: Message,
        ctx: &AgentContext<'_>,
    ) -> agentmesh::Result<Option<Message>> {
        self.log
            .lock()
            .push(format!("{}@{}:{}", ctx.id(), ctx.round, message.content()));
        Ok(self
            .next
            .clone()
            .map(|next| ctx.send(next, message.content(), MessageKind::Request)))
    }
}

struct PanickyAgent;

#[async_trait]
impl Agent for PanickyAgent {
    async fn handle(
        &self,
        _message: Message,
        _ctx: &AgentContext<'_>,
    ) -> agentmesh::Result<Option<Message>> {
        panic!("corrupted ledger");
    }
}

struct SlowAgent;

#[async_trait]
impl Agent for SlowAgent {
    async fn handle(
        &self,
        message: Message,
        ctx: &AgentContext<'_>,
    ) -> agentmesh::Result<Option<Message>> {
        sleep(Duration::from_millis(500)).await;
        Ok(Some(ctx.send(
            message.sender().clone(),
            "late",
            MessageKind::Response,
        )))
    }
}

struct BlockingAgent;

#[async_trait]
impl Agent for BlockingAgent {
    async fn handle(
        &self,
        message: Message,
        ctx: &AgentContext<'_>,
    ) -> agentmesh::Result<Option<Message>> {
        std::thread::sleep(std::time::Duration::from_millis(100));
        Ok(Some(ctx.send(
            message.sender().clone(),
            "late",
            MessageKind::Response,
        )))
    }
}

/// 记录同时在处理中的 handler 数量及峰值
struct GaugedAgent {
    gauge: Arc<Mutex<(usize, usize)>>,
}

#[async_trait]
impl Agent for GaugedAgent {
    async fn handle(
        &self,
        _message: Message,
        _ctx: &AgentContext<'_>,
    ) -> agentmesh::Result<Option<Message>> {
        {
            let mut gauge = self.gauge.lock();
            gauge.0 += 1;
            gauge.1 = gauge.1.max(gauge.0);
        }
        sleep(Duration::from_millis(30)).await;
        self.gauge.lock().0 -= 1;
        Ok(None)
    }
}

fn market_coordinator(trend: Option<TrendLabel>) -> anyhow::Result<Coordinator> {
    let bindings = RoleBinding::default();
    let mut coordinator = Coordinator::new(bindings.clone());
    let analyst = match trend {
        Some(trend) => DataAnalyst::new(Arc::new(FixedTrendProvider(trend))),
        None => DataAnalyst::new(Arc::new(RandomTrendProvider::seeded(42))),
    };
    coordinator.register(bindings.analyst.clone(), Arc::new(analyst))?;
    coordinator.register(
        bindings.decision_maker.clone(),
        Arc::new(DecisionMaker::new(bindings.coordinator.clone())),
    )?;
    Ok(coordinator)
}

#[tokio::test]
async fn market_strategy_reply_goes_back_to_coordinator() -> anyhow::Result<()> {
    let coordinator = market_coordinator(None)?;

    let state = coordinator
        .orchestrate_rounds("Market Strategy Planning", 3)
        .await;

    assert_eq!(state.rounds, 3);
    assert_eq!(state.history.len(), 2);

    let seed = &state.history[0];
    assert_eq!(seed.round, 0);
    assert_eq!(seed.message.sender(), "coordinator");
    assert_eq!(seed.message.receiver(), "analyst");
    assert_eq!(seed.message.kind(), &MessageKind::DataRequest);
    assert_eq!(seed.message.content(), "Market Strategy Planning");

    let reply = &state.history[1];
    assert_eq!(reply.round, 1);
    assert_eq!(reply.outcome, RouteOutcome::Delivered);
    assert_eq!(reply.message.sender(), "analyst");
    assert_eq!(reply.message.receiver(), "coordinator");
    assert_eq!(reply.message.kind(), &MessageKind::AnalysisResult);
    assert!(reply.message.content().starts_with("Analysis shows trend: "));

    // rounds 2 and 3 route nothing
    assert_eq!(state.routed_in_round(2).count(), 0);
    assert_eq!(state.routed_in_round(3).count(), 0);

    let analyst = state.agent("analyst").expect("analyst snapshot");
    assert_eq!(analyst.strings("insights"), vec![reply.message.content()]);
    let decision_maker = state.agent("decision_maker").expect("decision maker snapshot");
    assert!(decision_maker.strings("decisions").is_empty());
    assert!(state.is_quiescent());
    assert!(state.failures.is_empty());
    Ok(())
}

#[tokio::test]
async fn zero_rounds_only_routes_the_seed() -> anyhow::Result<()> {
    let coordinator = market_coordinator(Some(TrendLabel::Increasing))?;

    let state = coordinator.orchestrate_rounds("Market Strategy Planning", 0).await;

    assert_eq!(state.history.len(), 1);
    let pending = state.pending("analyst");
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].kind(), &MessageKind::DataRequest);
    assert!(state.knowledge("analyst").unwrap().is_empty());
    assert_eq!(coordinator.agent("analyst").unwrap().mailbox().len(), 1);
    Ok(())
}

#[tokio::test]
async fn forwarding_analyst_drives_a_decision_in_one_round() -> anyhow::Result<()> {
    let bindings = RoleBinding::default();
    let mut coordinator = Coordinator::new(bindings.clone());
    coordinator.register(
        bindings.analyst.clone(),
        Arc::new(
            DataAnalyst::new(Arc::new(FixedTrendProvider(TrendLabel::Increasing)))
                .forward_to(bindings.decision_maker.clone()),
        ),
    )?;
    coordinator.register(
        bindings.decision_maker.clone(),
        Arc::new(DecisionMaker::new(bindings.coordinator.clone())),
    )?;

    let state = coordinator.orchestrate_rounds("sales", 1).await;

    let decisions = state.agent("decision_maker").unwrap().strings("decisions");
    assert_eq!(decisions, vec!["Expand operations"]);
    let last = state.history.last().unwrap();
    assert_eq!(last.message.kind(), &MessageKind::Decision);
    assert_eq!(last.message.receiver(), "coordinator");
    assert_eq!(last.message.content(), "Decision: Expand operations");
    // the coordinator absorbed the decision at the end of the round
    assert!(state.pending("coordinator").is_empty());
    Ok(())
}

#[tokio::test]
async fn unknown_receiver_leaves_system_untouched() -> anyhow::Result<()> {
    let bindings = RoleBinding {
        analyst: AgentId::from("ghost"),
        ..RoleBinding::default()
    };
    let mut coordinator = Coordinator::new(bindings);
    coordinator.register(
        "analyst",
        Arc::new(DataAnalyst::new(Arc::new(FixedTrendProvider(TrendLabel::Stable)))),
    )?;
    coordinator.register("decision_maker", Arc::new(DecisionMaker::new("coordinator")))?;
    let before = coordinator.state("inspect").agents;

    let state = coordinator.orchestrate_rounds("inspect", 1).await;

    assert_eq!(state.agents, before);
    assert_eq!(state.dropped_count(), 1);
    assert_eq!(state.dropped().next().unwrap().receiver(), "ghost");
    assert!(state.failures.is_empty());
    Ok(())
}

#[tokio::test]
async fn route_appends_exactly_once_or_not_at_all() -> anyhow::Result<()> {
    let coordinator = market_coordinator(Some(TrendLabel::Stable))?;
    coordinator.route(Message::info("coordinator", "decision_maker", "first"));

    let message = Message::info("coordinator", "decision_maker", "second");
    assert_eq!(coordinator.route(message.clone()), RouteOutcome::Delivered);
    let mailbox = coordinator.agent("decision_maker").unwrap().mailbox();
    assert_eq!(mailbox.len(), 2);
    assert_eq!(mailbox.last(), Some(message.clone()));
    assert_eq!(
        mailbox.snapshot().iter().filter(|m| **m == message).count(),
        1
    );

    let before: Vec<usize> = coordinator.agents().map(|cell| cell.mailbox().len()).collect();
    let own_before = coordinator.agent("coordinator").unwrap().mailbox().len();
    assert_eq!(
        coordinator.route(Message::info("coordinator", "ghost", "lost")),
        RouteOutcome::Dropped
    );
    let after: Vec<usize> = coordinator.agents().map(|cell| cell.mailbox().len()).collect();
    assert_eq!(before, after);
    assert_eq!(
        coordinator.agent("coordinator").unwrap().mailbox().len(),
        own_before
    );
    Ok(())
}

#[tokio::test]
async fn drain_empties_mailbox_regardless_of_responses() -> anyhow::Result<()> {
    let coordinator = market_coordinator(Some(TrendLabel::Decreasing))?;
    for index in 0..5 {
        let kind = if index % 2 == 0 {
            MessageKind::AnalysisResult
        } else {
            MessageKind::Info
        };
        coordinator.route(Message::new(
            "analyst",
            "decision_maker",
            format!("Analysis shows trend: decreasing #{index}"),
            kind,
        ));
    }

    let outcome = coordinator.drain_agent("decision_maker", 1).await?;

    assert_eq!(outcome.processed, 5);
    assert_eq!(outcome.responses.len(), 3);
    assert!(outcome
        .responses
        .iter()
        .all(|m| m.content() == "Decision: Reduce costs"));
    assert!(coordinator.agent("decision_maker").unwrap().mailbox().is_empty());
    // responses are returned, not routed
    assert!(coordinator.agent("coordinator").unwrap().mailbox().is_empty());

    let err = coordinator.drain_agent("ghost", 1).await.unwrap_err();
    assert!(matches!(err, AgentMeshError::AgentNotRegistered(_)));
    Ok(())
}

#[tokio::test]
async fn duplicate_registration_is_rejected() -> anyhow::Result<()> {
    let mut coordinator = market_coordinator(Some(TrendLabel::Stable))?;
    let err = coordinator
        .register("analyst", Arc::new(GenericAgent::new()))
        .unwrap_err();
    assert!(matches!(err, AgentMeshError::DuplicateAgent(id) if id == "analyst"));
    assert_eq!(coordinator.agents().count(), 2);
    Ok(())
}

#[tokio::test]
async fn self_addressed_messages_wait_for_the_next_round() -> anyhow::Result<()> {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut coordinator = Coordinator::new(RoleBinding::default());
    coordinator.register(
        "analyst",
        Arc::new(RelayAgent::new(Some("analyst"), Arc::clone(&log))),
    )?;

    let state = coordinator.orchestrate_rounds("loop", 3).await;

    assert_eq!(
        *log.lock(),
        vec!["analyst@1:loop", "analyst@2:loop", "analyst@3:loop"]
    );
    assert_eq!(state.pending("analyst").len(), 1);
    Ok(())
}

#[tokio::test]
async fn sequential_rounds_let_later_agents_see_same_round_messages() -> anyhow::Result<()> {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut coordinator = Coordinator::new(RoleBinding::default());
    coordinator.register(
        "analyst",
        Arc::new(RelayAgent::new(Some("worker"), Arc::clone(&log))),
    )?;
    coordinator.register("worker", Arc::new(RelayAgent::new(None, Arc::clone(&log))))?;

    coordinator.orchestrate_rounds("job", 2).await;

    assert_eq!(*log.lock(), vec!["analyst@1:job", "worker@1:job"]);
    Ok(())
}

#[tokio::test]
async fn concurrent_rounds_route_after_the_barrier() -> anyhow::Result<()> {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut coordinator = Coordinator::new(RoleBinding::default())
        .with_config(OrchestrationConfig::new().concurrent(4));
    coordinator.register(
        "analyst",
        Arc::new(RelayAgent::new(Some("worker"), Arc::clone(&log))),
    )?;
    coordinator.register(
        "worker",
        Arc::new(RelayAgent::new(Some("coordinator"), Arc::clone(&log))),
    )?;

    let state = coordinator.orchestrate_rounds("job", 2).await;

    assert_eq!(*log.lock(), vec!["analyst@1:job", "worker@2:job"]);
    let rounds: Vec<u32> = state.history.iter().map(|entry| entry.round).collect();
    assert_eq!(rounds, vec![0, 1, 2]);
    assert!(state.is_quiescent());
    Ok(())
}

#[tokio::test]
async fn concurrent_drains_stay_within_max_concurrency() -> anyhow::Result<()> {
    for limit in [1, 2, 3] {
        let gauge = Arc::new(Mutex::new((0, 0)));
        let mut coordinator = Coordinator::new(RoleBinding::default())
            .with_config(OrchestrationConfig::new().concurrent(limit));
        for name in ["analyst", "w1", "w2", "w3", "w4"] {
            coordinator.register(
                name,
                Arc::new(GaugedAgent {
                    gauge: Arc::clone(&gauge),
                }),
            )?;
        }
        for name in ["w1", "w2", "w3", "w4"] {
            coordinator.route(Message::info("coordinator", name, "go"));
        }

        let state = coordinator.orchestrate_rounds("job", 1).await;

        assert!(state.failures.is_empty());
        let (in_flight, peak) = *gauge.lock();
        assert_eq!(in_flight, 0);
        assert!(peak <= limit, "peak {peak} exceeded limit {limit}");
        if limit > 1 {
            assert!(peak > 1, "handlers never overlapped with limit {limit}");
        }
    }
    Ok(())
}

#[tokio::test]
async fn coordinator_handler_replies_are_routed_and_drained_next_round() -> anyhow::Result<()> {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut coordinator = Coordinator::new(RoleBinding::default()).with_handler(Arc::new(
        RelayAgent::new(Some("analyst"), Arc::clone(&log)),
    ));
    coordinator.register(
        "analyst",
        Arc::new(RelayAgent::new(Some("coordinator"), Arc::clone(&log))),
    )?;

    let state = coordinator.orchestrate_rounds("job", 2).await;

    let replies: Vec<_> = state
        .history
        .iter()
        .filter(|entry| entry.message.sender() == "coordinator" && entry.round > 0)
        .collect();
    assert_eq!(replies.len(), 2);
    assert_eq!(replies[0].round, 1);
    assert_eq!(replies[0].message.receiver(), "analyst");
    assert_eq!(replies[0].outcome, RouteOutcome::Delivered);
    assert_eq!(
        *log.lock(),
        vec!["analyst@1:job", "coordinator@1:job", "analyst@2:job", "coordinator@2:job"]
    );
    // the round 2 reply waits for a third round
    assert_eq!(state.pending("analyst").len(), 1);
    assert!(state.failures.is_empty());
    Ok(())
}

#[tokio::test]
async fn panicking_handler_is_isolated() -> anyhow::Result<()> {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut coordinator = Coordinator::new(RoleBinding::default());
    coordinator.register("analyst", Arc::new(PanickyAgent))?;
    coordinator.register("worker", Arc::new(RelayAgent::new(None, Arc::clone(&log))))?;
    coordinator.route(Message::info("coordinator", "worker", "still runs"));

    let state = coordinator.orchestrate_rounds("task", 3).await;

    assert_eq!(*log.lock(), vec!["worker@1:still runs"]);
    assert_eq!(state.failures.len(), 1);
    let failure = &state.failures[0];
    assert_eq!(failure.agent, "analyst");
    assert_eq!(failure.round, 1);
    assert_eq!(failure.message.content(), "task");
    assert_eq!(failure.reason, FailureReason::Panic("corrupted ledger".into()));
    assert_eq!(state.rounds, 3);
    assert!(state.pending("analyst").is_empty());
    Ok(())
}

#[tokio::test]
async fn slow_handler_hits_the_deadline() -> anyhow::Result<()> {
    let mut coordinator = Coordinator::new(RoleBinding::default())
        .with_config(OrchestrationConfig::new().with_handler_timeout(Duration::from_millis(20)));
    coordinator.register("analyst", Arc::new(SlowAgent))?;

    let state = coordinator.orchestrate_rounds("task", 2).await;

    assert_eq!(state.failures.len(), 1);
    assert_eq!(
        state.failures[0].reason,
        FailureReason::Timeout { limit_ms: 20 }
    );
    // the late reply never gets routed
    assert_eq!(state.history.len(), 1);
    Ok(())
}

#[tokio::test]
async fn blocking_handler_overrun_is_recorded_after_it_returns() -> anyhow::Result<()> {
    let mut coordinator = Coordinator::new(RoleBinding::default())
        .with_config(OrchestrationConfig::new().with_handler_timeout(Duration::from_millis(20)));
    coordinator.register("analyst", Arc::new(BlockingAgent))?;

    let state = coordinator.orchestrate_rounds("task", 1).await;

    assert_eq!(state.failures.len(), 1);
    assert_eq!(state.failures[0].agent, "analyst");
    assert_eq!(
        state.failures[0].reason,
        FailureReason::Timeout { limit_ms: 20 }
    );
    assert_eq!(state.history.len(), 1);
    assert!(state.pending("coordinator").is_empty());
    Ok(())
}

#[tokio::test]
async fn failing_provider_is_recorded_as_handler_error() -> anyhow::Result<()> {
    use agentmesh::{MockDataSource, SeriesTrendProvider};

    let mut coordinator = Coordinator::new(RoleBinding::default());
    let provider = SeriesTrendProvider::new(Arc::new(MockDataSource::new()));
    coordinator.register("analyst", Arc::new(DataAnalyst::new(Arc::new(provider))))?;

    let state = coordinator.orchestrate_rounds("missing_dataset", 1).await;

    assert_eq!(state.failures.len(), 1);
    match &state.failures[0].reason {
        FailureReason::Error(text) => assert!(text.contains("missing_dataset")),
        other => panic!("unexpected failure reason {other:?}"),
    }
    assert!(state.agent("analyst").unwrap().strings("insights").is_empty());
    Ok(())
}
