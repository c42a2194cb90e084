//! `kubeclaw tools`: List the tool catalog.

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config()?;
    let orchestrator = super::build_orchestrator(&config)?;
    let catalog = orchestrator.catalog();

    println!("KubeClaw Tools ({})", catalog.len());
    println!("==================");
    for tool in catalog.iter() {
        println!();
        println!("  {}", tool.name());
        println!("    {}", tool.description());
        if let Some(schema) = tool.args_schema() {
            let args: Vec<&str> = schema["properties"]
                .as_object()
                .map(|props| props.keys().map(String::as_str).collect())
                .unwrap_or_default();
            if !args.is_empty() {
                println!("    args: {}", args.join(", "));
            }
        }
    }

    Ok(())
}
