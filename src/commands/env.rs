// ABOUTME: Environment commands: read and write per-environment settings.
// ABOUTME: Values live in .aksdeploy/<env>/env.yml under the project root.

use aksdeploy::config::Environment;
use aksdeploy::error::{Error, Result};
use aksdeploy::output::Output;
use std::path::Path;

pub fn env_set(
    project_root: &Path,
    environment: &str,
    key: &str,
    value: &str,
    output: &Output,
) -> Result<()> {
    let mut env = Environment::load(project_root, environment)?;
    env.set(key, value);
    env.save()?;
    output.success(&format!("Set {key} in environment '{environment}'"));
    Ok(())
}

pub fn env_get(project_root: &Path, environment: &str, key: &str) -> Result<()> {
    let env = Environment::load(project_root, environment)?;
    let value = env
        .get(key)
        .ok_or_else(|| Error::MissingEnvVar(key.to_string()))?;
    println!("{value}");
    Ok(())
}

pub fn env_list(project_root: &Path, environment: &str, output: &Output) -> Result<()> {
    let env = Environment::load(project_root, environment)?;
    output.values(env.values());
    Ok(())
}
