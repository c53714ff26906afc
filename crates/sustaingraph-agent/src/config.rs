use anyhow::{Context, Result};
use std::ffi::OsString;
use std::path::PathBuf;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AgentConfig {
    pub config: Option<PathBuf>,
    pub dataset: Option<PathBuf>,
    pub threshold: Option<f64>,
    pub seed: Option<u64>,
    pub jitter: Option<u32>,
    pub socket: Option<PathBuf>,
    /// Headless mode: run this many ticks, print the snapshot and exit.
    pub ticks: Option<u64>,
}

pub fn parse_args() -> Result<AgentConfig> {
    parse_args_from(std::env::args_os().skip(1))
}

fn parse_args_from<I>(args: I) -> Result<AgentConfig>
where
    I: IntoIterator<Item = OsString>,
{
    let mut config = AgentConfig::default();
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        let Some(flag) = arg.to_str() else {
            anyhow::bail!("unknown argument: {:?}", arg);
        };
        match flag {
            "--config" => config.config = Some(PathBuf::from(value(&mut args, flag)?)),
            "--dataset" => config.dataset = Some(PathBuf::from(value(&mut args, flag)?)),
            "--socket" => config.socket = Some(PathBuf::from(value(&mut args, flag)?)),
            "--threshold" => config.threshold = Some(number(&mut args, flag)?),
            "--seed" => config.seed = Some(number(&mut args, flag)?),
            "--jitter" => config.jitter = Some(number(&mut args, flag)?),
            "--ticks" => config.ticks = Some(number(&mut args, flag)?),
            _ => anyhow::bail!("unknown argument: {:?}", arg),
        }
    }

    Ok(config)
}

fn value<I>(args: &mut I, flag: &str) -> Result<OsString>
where
    I: Iterator<Item = OsString>,
{
    args.next()
        .ok_or_else(|| anyhow::anyhow!("{flag} expects a value"))
}

fn number<I, T>(args: &mut I, flag: &str) -> Result<T>
where
    I: Iterator<Item = OsString>,
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw = value(args, flag)?;
    let raw = raw.to_string_lossy();
    raw.parse::<T>()
        .with_context(|| format!("{flag}: invalid number {raw:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<OsString> {
        list.iter().map(OsString::from).collect()
    }

    #[test]
    fn empty_args_leave_everything_unset() {
        let config = parse_args_from(Vec::<OsString>::new()).expect("config parsed");
        assert_eq!(config, AgentConfig::default());
    }

    #[test]
    fn parses_every_flag() {
        let config = parse_args_from(args(&[
            "--config",
            "/etc/sg/layout.toml",
            "--dataset",
            "regs.json",
            "--threshold",
            "45.5",
            "--seed",
            "7",
            "--jitter",
            "30",
            "--socket",
            "/tmp/x.sock",
            "--ticks",
            "200",
        ]))
        .expect("config parsed");

        assert_eq!(config.config, Some(PathBuf::from("/etc/sg/layout.toml")));
        assert_eq!(config.dataset, Some(PathBuf::from("regs.json")));
        assert_eq!(config.threshold, Some(45.5));
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.jitter, Some(30));
        assert_eq!(config.socket, Some(PathBuf::from("/tmp/x.sock")));
        assert_eq!(config.ticks, Some(200));
    }

    #[test]
    fn rejects_unknown_flags_and_missing_values() {
        assert!(parse_args_from(args(&["--mode", "user"])).is_err());
        assert!(parse_args_from(args(&["--dataset"])).is_err());
        let err = parse_args_from(args(&["--seed", "abc"])).expect_err("bad number");
        assert!(err.to_string().contains("--seed"));
    }
}
