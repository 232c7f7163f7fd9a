use anyhow::Result;

use crate::args::{Cli, Command};

mod check;
mod resolve;

pub fn dispatch(cli: Cli) -> Result<()> {
    match cli.command.clone() {
        Command::Resolve {
            activity,
            quantity,
            unit,
            region,
            context,
        } => resolve::run(&cli, &activity, quantity, &unit, region, &context),
        Command::Check => check::run(&cli),
    }
}
