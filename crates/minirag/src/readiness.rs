//! Startup check that the model provider is reachable and has the required models

use crate::error::{Error, Result};
use crate::generation::ollama::model_matches;
use crate::providers::LlmProvider;

/// Verify liveness, then pull every required model that is not installed.
///
/// Blocks until all pulls finish; any failure is fatal to startup.
pub async fn ensure_ready(llm: &dyn LlmProvider, required: &[&str]) -> Result<()> {
    if !llm.health_check().await? {
        return Err(Error::ProviderUnavailable(format!(
            "{} provider did not answer the liveness probe",
            llm.name()
        )));
    }

    let installed = llm.list_models().await?;
    tracing::debug!("Installed models: {:?}", installed);

    let mut checked: Vec<&str> = Vec::new();
    for &model in required {
        if checked.contains(&model) {
            continue;
        }
        checked.push(model);

        if installed.iter().any(|name| model_matches(name, model)) {
            tracing::info!("Model {} is available", model);
            continue;
        }

        tracing::info!("Model {} not found, pulling it (this may take a while)", model);
        llm.pull_model(model).await?;
        tracing::info!("Model {} pulled", model);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedLlm;

    #[tokio::test]
    async fn test_offline_provider_is_fatal() {
        let llm = ScriptedLlm::default();
        let result = ensure_ready(&llm, &["gemma3:12b"]).await;
        assert!(matches!(result, Err(Error::ProviderUnavailable(_))));
    }

    #[tokio::test]
    async fn test_pulls_only_missing_models() {
        let llm = ScriptedLlm::replying(&[]);
        llm.installed.lock().push("nomic-embed-text:latest".to_string());

        ensure_ready(&llm, &["gemma3:12b", "nomic-embed-text", "gemma3:12b"])
            .await
            .unwrap();

        assert_eq!(*llm.pulled.lock(), vec!["gemma3:12b".to_string()]);
    }

    #[tokio::test]
    async fn test_pull_failure_is_fatal() {
        let llm = ScriptedLlm {
            fail_pull: true,
            ..ScriptedLlm::replying(&[])
        };
        let result = ensure_ready(&llm, &["gemma3:12b"]).await;
        assert!(matches!(result, Err(Error::ModelPull { .. })));
    }
}
