//! Prompt loader for YAML prompt definitions.
//!
//! Built-in definitions ship with the crate. A workspace may override any of
//! them by placing `<id>.yml` in `.lawqa/prompts/`.

use crate::types::PromptDefinition;
use lawqa_core::{AppError, AppResult};
use std::path::Path;

/// Prompt used to pick statute articles worth fetching directly.
pub const EXTRACT_PROMPT: &str = "rag.extract_articles";

/// Prompt used to synthesize the grounded answer.
pub const ANSWER_PROMPT: &str = "rag.answer";

/// Prompt used to answer from the complete statute text.
pub const CONSULT_PROMPT: &str = "statute.consult";

const BUILTIN_PROMPTS: [(&str, &str); 3] = [
    (EXTRACT_PROMPT, include_str!("../prompts/rag.extract_articles.yml")),
    (ANSWER_PROMPT, include_str!("../prompts/rag.answer.yml")),
    (CONSULT_PROMPT, include_str!("../prompts/statute.consult.yml")),
];

/// Load a prompt definition by ID.
///
/// Looks for `.lawqa/prompts/<id>.yml` in the workspace first and falls back
/// to the built-in definition.
///
/// # Example
/// ```no_run
/// use lawqa_prompt::load_prompt;
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let prompt = load_prompt(Path::new("."), "rag.answer")?;
/// println!("Loaded prompt: {}", prompt.title);
/// # Ok(())
/// # }
/// ```
pub fn load_prompt(workspace_path: &Path, prompt_id: &str) -> AppResult<PromptDefinition> {
    let prompt_file = workspace_path
        .join(".lawqa/prompts")
        .join(format!("{}.yml", prompt_id));

    let (contents, origin) = if prompt_file.exists() {
        tracing::debug!("Loading prompt override from: {:?}", prompt_file);
        let contents = std::fs::read_to_string(&prompt_file).map_err(|e| {
            AppError::Prompt(format!(
                "Failed to read prompt file {:?}: {}",
                prompt_file, e
            ))
        })?;
        (contents, prompt_file.display().to_string())
    } else {
        let builtin = BUILTIN_PROMPTS
            .iter()
            .find(|(id, _)| *id == prompt_id)
            .map(|(_, yaml)| yaml.to_string())
            .ok_or_else(|| AppError::Prompt(format!("Unknown prompt: {}", prompt_id)))?;
        (builtin, format!("builtin:{}", prompt_id))
    };

    let definition: PromptDefinition = serde_yaml::from_str(&contents).map_err(|e| {
        AppError::Prompt(format!("Failed to parse prompt YAML {}: {}", origin, e))
    })?;

    validate_prompt(&definition)?;

    if definition.id != prompt_id {
        return Err(AppError::Prompt(format!(
            "Prompt {} declares id '{}', expected '{}'",
            origin, definition.id, prompt_id
        )));
    }

    tracing::debug!("Loaded prompt: {} ({})", definition.id, origin);

    Ok(definition)
}

/// List all available prompt IDs (built-in plus workspace overrides).
pub fn list_prompts(workspace_path: &Path) -> AppResult<Vec<String>> {
    let mut prompt_ids: Vec<String> = BUILTIN_PROMPTS
        .iter()
        .map(|(id, _)| id.to_string())
        .collect();

    let prompts_dir = workspace_path.join(".lawqa/prompts");

    if prompts_dir.exists() {
        for entry in walkdir::WalkDir::new(&prompts_dir)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("yml") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    if !prompt_ids.iter().any(|id| id == stem) {
                        prompt_ids.push(stem.to_string());
                    }
                }
            }
        }
    }

    prompt_ids.sort();
    Ok(prompt_ids)
}

/// Validate a prompt definition.
fn validate_prompt(def: &PromptDefinition) -> AppResult<()> {
    if def.id.is_empty() {
        return Err(AppError::Prompt("Prompt ID cannot be empty".to_string()));
    }

    if def.title.is_empty() {
        return Err(AppError::Prompt("Prompt title cannot be empty".to_string()));
    }

    if def.api_version.is_empty() {
        return Err(AppError::Prompt(
            "Prompt apiVersion cannot be empty".to_string(),
        ));
    }

    if def.template.is_empty() {
        return Err(AppError::Prompt(
            "Prompt template cannot be empty".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_builtin_prompts_load() {
        let temp = TempDir::new().unwrap();
        for id in [EXTRACT_PROMPT, ANSWER_PROMPT, CONSULT_PROMPT] {
            let def = load_prompt(temp.path(), id).unwrap();
            assert_eq!(def.id, id);
            assert!(def.output.is_json());
        }
    }

    #[test]
    fn test_unknown_prompt() {
        let temp = TempDir::new().unwrap();
        let result = load_prompt(temp.path(), "does.not.exist");
        assert!(result.is_err());
    }

    #[test]
    fn test_workspace_override() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join(".lawqa/prompts");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("rag.answer.yml"),
            r#"
id: rag.answer
title: Custom
apiVersion: "1.0"
template: "Q: {{question}}"
output:
  format: json
"#,
        )
        .unwrap();

        let def = load_prompt(temp.path(), ANSWER_PROMPT).unwrap();
        assert_eq!(def.title, "Custom");
        assert!(def.system.is_none());
    }

    #[test]
    fn test_override_with_mismatched_id_rejected() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join(".lawqa/prompts");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("rag.answer.yml"),
            "id: other\ntitle: X\napiVersion: \"1.0\"\ntemplate: x\noutput:\n  format: json\n",
        )
        .unwrap();

        assert!(load_prompt(temp.path(), ANSWER_PROMPT).is_err());
    }

    #[test]
    fn test_list_prompts_includes_overrides() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join(".lawqa/prompts");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("custom.summary.yml"), "id: custom.summary").unwrap();

        let ids = list_prompts(temp.path()).unwrap();
        assert_eq!(ids.len(), 4);
        assert!(ids.contains(&"custom.summary".to_string()));
        assert!(ids.contains(&ANSWER_PROMPT.to_string()));
    }
}
