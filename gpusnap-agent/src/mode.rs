use clap::ValueEnum;

/// How string values are escaped in the snapshot document.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum EscapeMode {
    /// Full JSON escaping, control characters included.
    #[default]
    Strict,
    /// Only `"` and `\` are escaped; control characters pass through raw.
    Compat,
}
