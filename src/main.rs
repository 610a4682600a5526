use ait_introspect::{AppConfig, CliArgs, IntrospectError, LoggingConfig, commands, init_logging};
use clap::Parser;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = CliArgs::parse();

    let _guard = match init_logging(LoggingConfig::from_env()) {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("error: {err:#}");
            return ExitCode::FAILURE;
        }
    };

    let result = AppConfig::from_args(&cli).and_then(|config| commands::run(&config, &cli.command));

    match result.and_then(|output| Ok(serde_json::to_string_pretty(&output)?)) {
        Ok(rendered) => {
            println!("{rendered}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            let code = err
                .chain()
                .find_map(|cause| cause.downcast_ref::<IntrospectError>())
                .map(|cause| cause.code());
            match code {
                Some(code) => {
                    tracing::error!(code = %code, category = code.category(), error = %err, "command failed");
                    eprintln!("error: {err:#}");
                    ExitCode::from(u8::try_from(code.code()).unwrap_or(1))
                }
                None => {
                    eprintln!("error: {err:#}");
                    ExitCode::FAILURE
                }
            }
        }
    }
}
