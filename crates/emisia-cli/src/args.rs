use clap::{Parser, Subcommand};

#[derive(Parser, Debug, Clone)]
#[command(name = "emisia", version, about = "EMISIA emission factor resolution CLI")]
pub struct Cli {
    /// Emit JSON output on stdout.
    #[arg(long, global = true)]
    pub json: bool,

    /// Reference records file (JSON).
    #[arg(long, global = true, default_value = "factors.json")]
    pub records: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Resolve one activity measurement to a CO2e mass.
    Resolve {
        /// Activity name (e.g. "diesel", "electricity").
        activity: String,

        /// Measured quantity; must be positive.
        quantity: f64,

        /// Unit of the quantity (e.g. litre, kwh, tonne-km).
        unit: String,

        /// Region to resolve against (default: engine default).
        #[arg(long)]
        region: Option<String>,

        /// Free-text context passed to the estimation layer.
        #[arg(long, default_value = "")]
        context: String,
    },

    /// Load and validate a reference records file.
    Check,
}
