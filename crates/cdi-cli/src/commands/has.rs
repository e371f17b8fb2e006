use super::{json_pretty, EXIT_FAILURE, EXIT_SUCCESS};
use cdi_core::Injector;

pub fn run(injector: &Injector, device: &str, json: bool) -> Result<u8, String> {
    let found = injector.has_device(device);
    if json {
        let payload = serde_json::json!({
            "device": device,
            "found": found,
        });
        println!("{}", json_pretty(&payload)?);
    } else if found {
        println!("{device}: available");
    } else {
        println!("{device}: not found");
    }
    Ok(if found { EXIT_SUCCESS } else { EXIT_FAILURE })
}
