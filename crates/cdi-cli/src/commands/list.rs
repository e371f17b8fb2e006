use super::{colorize_runtime, json_pretty, EXIT_SUCCESS};
use cdi_core::Registry;

pub fn run(registry: &Registry, json: bool) -> Result<u8, String> {
    let index = registry.load();

    if json {
        let specs: Vec<_> = index
            .vendors()
            .flat_map(|(kind, runtimes)| {
                runtimes.iter().map(move |(runtime, spec)| {
                    let devices: Vec<&str> = spec.devices.iter().map(|d| d.name.as_str()).collect();
                    serde_json::json!({
                        "kind": kind,
                        "runtime": runtime,
                        "cdi_version": spec.cdi_version,
                        "devices": devices,
                    })
                })
            })
            .collect();
        let diagnostics: Vec<String> = index.diagnostics().iter().map(ToString::to_string).collect();
        let payload = serde_json::json!({
            "spec_dir": registry.root(),
            "specs": specs,
            "diagnostics": diagnostics,
        });
        println!("{}", json_pretty(&payload)?);
        return Ok(EXIT_SUCCESS);
    }

    if index.is_empty() {
        println!("no CDI specs found in {}", registry.root().display());
    } else {
        println!("{:<32} {:<10} DEVICES", "VENDOR", "RUNTIME");
        for (kind, runtimes) in index.vendors() {
            for (runtime, spec) in runtimes {
                let names: Vec<&str> = spec.devices.iter().map(|d| d.name.as_str()).collect();
                println!(
                    "{:<32} {:<10} {}",
                    kind,
                    colorize_runtime(runtime),
                    names.join(", ")
                );
            }
        }
    }

    for diagnostic in index.diagnostics().iter().filter(|d| d.is_warning()) {
        eprintln!("warning: {diagnostic}");
    }
    Ok(EXIT_SUCCESS)
}
