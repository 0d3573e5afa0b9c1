use std::sync::Arc;

use agentmesh::{
    Coordinator, DataAnalyst, DecisionMaker, FallbackDataSource, MockDataSource,
    OrchestrationConfig, RoleBinding, SeriesTrendProvider,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    // No warehouse here: the primary source is empty and every lookup falls back.
    let warehouse = MockDataSource::new();
    let fallback = MockDataSource::new()
        .with_dataset("quarterly_revenue", vec![120.0, 126.0, 131.0, 140.0, 152.0]);
    let source = FallbackDataSource::new(Arc::new(warehouse), Arc::new(fallback));

    let bindings = RoleBinding::default();
    let mut coordinator = Coordinator::new(bindings.clone())
        .with_config(OrchestrationConfig::new().with_rounds(2));
    coordinator.register(
        bindings.analyst.clone(),
        Arc::new(
            DataAnalyst::new(Arc::new(SeriesTrendProvider::new(Arc::new(source))))
                .forward_to(bindings.decision_maker.clone()),
        ),
    )?;
    coordinator.register(
        bindings.decision_maker.clone(),
        Arc::new(DecisionMaker::new(bindings.coordinator.clone())),
    )?;

    let state = coordinator.orchestrate("quarterly_revenue").await;
    println!("{}", serde_json::to_string_pretty(&state)?);
    Ok(())
}
