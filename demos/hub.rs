use std::cell::RefCell;
use std::error::Error;
use std::rc::Rc;
use std::{env, fs};

use log::info;

use picolights::web::{self, Method, Request};
use picolights::{hub, GroupConfig, HubConfig, HubContext, StdDelay};
use picolights_testing::{VirtualLightBus, VirtualLightModule};

// Brings up a hub against a virtual lights module and serves a few requests.
//
// Usage: cargo run --example hub [config.json]
fn main() -> Result<(), Box<dyn Error>> {
    let config = match env::args().nth(1) {
        Some(path) => HubConfig::from_json(&fs::read_to_string(path)?)?,
        None => HubConfig::default(),
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(config.log_filter())).init();

    // A real hub would build its bus with `hub::i2c_bus(&config.bus, i2c)`.
    info!(
        "Virtual bus standing in for I2C at {} Hz, scan range {:?}",
        config.bus.frequency_hz,
        config.bus.scan_range()
    );

    let groups = GroupConfig::from_json(br#"{"0":[1,2],"1":[3]}"#)?;
    let module = VirtualLightModule::new(config.lights.address()).with_groups(groups);
    let bus = Rc::new(RefCell::new(VirtualLightBus::new(vec![module])));

    let lights = hub::bring_up(&config.lights, bus.clone());
    let mut delay = StdDelay;
    let mut context = HubContext::new(lights, &mut delay);

    let requests = [
        Request {
            method: Method::Get,
            path: "/test",
            body: "",
        },
        Request {
            method: Method::Post,
            path: "/",
            body: "r=255&g=0&b=0",
        },
    ];
    for request in &requests {
        match web::dispatch(&mut context, request) {
            Some(page) => info!("{:?} {} ->\n{}", request.method, request.path, page),
            None => info!("{:?} {} -> not found", request.method, request.path),
        }
    }

    info!("Final duties: {:?}", bus.borrow().module(0).duties());
    Ok(())
}
