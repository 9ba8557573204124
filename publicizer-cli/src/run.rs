use log::{debug, info};
use publicizer::{
    publicize, write_module_to_file, Error, Module, ModuleStats, PublicizeStats, WriteReport,
};

use crate::{app::RunConfig, error::CliError};

/// What a successful run did.
pub struct RunSummary {
    pub module_name: String,
    pub inventory: ModuleStats,
    pub changed: PublicizeStats,
    pub report: WriteReport,
}

/// Load, publicize and write the module named by `config`.
pub fn run(config: &RunConfig) -> Result<RunSummary, CliError> {
    let mut module = Module::from_file(&config.input).map_err(|source| match source {
        Error::FileError(_) => CliError::FileNotFound(config.input.clone()),
        source => CliError::Load {
            path: config.input.clone(),
            source,
        },
    })?;

    let inventory = module.stats();
    debug!(
        "Module {} (MVID {}), runtime {}",
        module.name(),
        module
            .mvid()
            .map_or_else(|| "none".to_string(), |mvid| mvid.to_string()),
        module.runtime_version()
    );
    debug!(
        "{} types, {} methods, {} fields, {} absent slots",
        inventory.types, inventory.methods, inventory.fields, inventory.absent
    );
    if !module.payload().is_il_only() {
        info!("{} contains native code", module.name());
    }

    let changed = publicize(&mut module, &config.publicize);
    debug!("{} declarations changed", changed.total());

    let report = write_module_to_file(&module, &config.output, &config.write).map_err(
        |source| CliError::Write {
            path: config.output.clone(),
            source,
        },
    )?;

    Ok(RunSummary {
        module_name: module.name().to_string(),
        inventory,
        changed,
        report,
    })
}
