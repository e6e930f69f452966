use tabled::Table;

use crate::{
    cli::{connect::authorize, load_config},
    error, info,
    spotify::SpotifyClient,
    types::DeviceTableRow,
    utils::find_device,
};

/// Lists the account's Spotify Connect devices.
pub async fn devices(open_browser: bool) {
    let config = load_config();
    let (http, store) = authorize(&config, open_browser).await;
    let client = SpotifyClient::new(http, &config.api_url, store);

    let devices = match client.devices().await {
        Ok(devices) => devices,
        Err(e) => error!("Cannot load devices: {}", e),
    };

    if devices.is_empty() {
        info!("No devices found. Open Spotify on this machine or another device.");
        return;
    }

    let rows: Vec<DeviceTableRow> = devices.iter().map(DeviceTableRow::from).collect();
    println!("{}", Table::new(rows));

    let name = config.local_device_name();
    match find_device(&devices, &name) {
        Some(device) => info!("This machine is \"{}\" ({})", device.name, device.id),
        None => info!("No device named \"{}\"; set SPOTLET_DEVICE_NAME to pick one.", name),
    }
}
