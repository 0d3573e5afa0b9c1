use std::sync::Arc;

use agentmesh::{Coordinator, DataAnalyst, DecisionMaker, RandomTrendProvider, RoleBinding};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let bindings = RoleBinding::default();
    let mut coordinator = Coordinator::new(bindings.clone());
    coordinator.register(
        bindings.analyst.clone(),
        Arc::new(DataAnalyst::new(Arc::new(RandomTrendProvider::new()))),
    )?;
    coordinator.register(
        bindings.decision_maker.clone(),
        Arc::new(DecisionMaker::new(bindings.coordinator.clone())),
    )?;

    let state = coordinator.orchestrate("Market Strategy Planning").await;

    for entry in &state.history {
        println!(
            "[round {}] {} -> {}: {}",
            entry.round,
            entry.message.sender(),
            entry.message.receiver(),
            entry.message.content()
        );
    }
    Ok(())
}
