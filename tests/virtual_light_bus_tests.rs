use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use picolights::core::{Command, Query, Target};
use picolights::demo::{self, DemoOptions, RAMP_PAUSE_MS, SWEEP_PAUSE_MS};
use picolights::web::{self, Method, Request};
use picolights::{hub, Address, DutyCycle, GroupConfig, GroupError, HubContext, LightController, LightError};
use picolights::{LightId, LightsConfig, Readiness, StatusCode};
use picolights_testing::{RecordingDelay, VirtualLightBus, VirtualLightModule};

fn groups() -> GroupConfig {
    GroupConfig::from_json(br#"{"0":[1,2],"1":[3]}"#).unwrap()
}

fn light(id: i32) -> LightId {
    LightId::try_new(id).unwrap()
}

fn sets(commands: &[Command]) -> Vec<(bool, u8, u8)> {
    commands
        .iter()
        .filter_map(|command| match *command {
            Command::Set {
                target: Target::Light(id),
                reset,
                duty,
            } => Some((reset, id.get(), duty.0)),
            _ => None,
        })
        .collect()
}

#[test]
fn controller_virtual_module_interaction() {
    let bus = VirtualLightBus::new(vec![
        VirtualLightModule::new(Address(0x20)),
        VirtualLightModule::new(Address(0x41)).with_groups(groups()),
    ]);
    let bus = Rc::new(RefCell::new(bus));

    let mut lights = LightController::new(bus.clone(), Address(0x41));
    lights.initialize().unwrap();
    assert_eq!(Readiness::Ready, lights.readiness());
    assert_eq!(&groups(), lights.groups());

    lights.set_light(false, 7, 90).unwrap();
    assert_eq!(DutyCycle(90), bus.borrow().module(1).duty(light(7)));

    // Setting a group should light exactly its members and leave the others alone.
    lights.set_group(false, 0, 200).unwrap();
    assert_eq!(DutyCycle(200), bus.borrow().module(1).duty(light(1)));
    assert_eq!(DutyCycle(200), bus.borrow().module(1).duty(light(2)));
    assert_eq!(DutyCycle::OFF, bus.borrow().module(1).duty(light(3)));
    assert_eq!(DutyCycle(90), bus.borrow().module(1).duty(light(7)));

    // Reset turns everything else off first.
    lights.set_group(true, 1, 30).unwrap();
    let expected = {
        let mut duties = [DutyCycle::OFF; 16];
        duties[3] = DutyCycle(30);
        duties
    };
    assert_eq!(&expected, bus.borrow().module(1).duties());

    let error = lights.set_group(false, 5, 200).unwrap_err();
    assert!(matches!(error, GroupError::NotInLocalConfig { .. }));

    // The other module never heard a thing.
    assert!(bus.borrow().module(0).commands().is_empty());
}

#[test]
fn invalid_arguments_never_reach_bus() {
    let bus = Rc::new(RefCell::new(VirtualLightBus::new(vec![VirtualLightModule::new(Address(0x41))])));
    let lights = LightController::new(bus.clone(), Address(0x41));

    for (id, duty) in [(16, 0), (-1, 0), (0, 256), (0, -1), (100, 1000)] {
        assert!(lights.set_light(true, id, duty).is_err());
        assert!(lights.set_group(true, id, duty).is_err());
    }
    assert!(matches!(lights.set_group(false, 0, 10), Err(GroupError::NotInLocalConfig { .. })));

    assert_eq!(0, bus.borrow().transaction_count());
}

#[test]
fn cached_group_duty_checked_before_bus() {
    let module = VirtualLightModule::new(Address(0x41)).with_groups(GroupConfig::from_json(br#"{"0":[1]}"#).unwrap());
    let bus = Rc::new(RefCell::new(VirtualLightBus::new(vec![module])));

    let mut lights = LightController::new(bus.clone(), Address(0x41));
    lights.initialize().unwrap();
    bus.borrow_mut().clear_history();

    let error = lights.set_group(false, 0, 256).unwrap_err();
    assert!(matches!(error, GroupError::DutyOutOfRange { value: 256 }));
    assert_eq!(Some(-20), error.code());

    let error = lights.set_group(false, 0, -1).unwrap_err();
    assert!(matches!(error, GroupError::DutyOutOfRange { value: -1 }));

    assert_eq!(0, bus.borrow().transaction_count());
}

#[test]
fn uncached_group_reported_before_duty() {
    let bus = Rc::new(RefCell::new(VirtualLightBus::new(vec![VirtualLightModule::new(Address(0x41))])));
    let lights = LightController::new(bus.clone(), Address(0x41));

    let error = lights.set_group(false, 3, 256).unwrap_err();
    assert!(matches!(error, GroupError::NotInLocalConfig { .. }));

    let error = lights.set_group(false, 16, 256).unwrap_err();
    assert!(matches!(error, GroupError::IdOutOfRange { value: 16 }));

    assert_eq!(0, bus.borrow().transaction_count());
}

#[test]
fn stale_groups_rejected_by_module() {
    let bus = VirtualLightBus::new(vec![VirtualLightModule::new(Address(0x41)).with_groups(groups())]);
    let bus = Rc::new(RefCell::new(bus));

    let mut lights = LightController::new(bus.clone(), Address(0x41));
    lights.initialize().unwrap();

    bus.borrow_mut().module_mut(0).set_groups(GroupConfig::new());
    let error = lights.set_group(false, 0, 200).unwrap_err();
    assert!(matches!(error, GroupError::DeviceRejected(StatusCode::GroupConfigOutOfSync)));

    // Refreshing the cache brings the driver back in line.
    assert!(lights.get_groups().unwrap().is_empty());
    assert!(matches!(lights.set_group(false, 0, 200), Err(GroupError::NotInLocalConfig { .. })));
}

#[test]
fn truncated_payload_fails_initialization() {
    let bus = VirtualLightBus::new(vec![VirtualLightModule::new(Address(0x41)).short_by(1)]);
    let bus = Rc::new(RefCell::new(bus));

    let mut lights = LightController::new(bus.clone(), Address(0x41));
    assert!(lights.initialize().is_err());
    assert_eq!(Readiness::BusChecked, lights.readiness());
}

#[test]
fn demo_sequence() {
    let bus = Rc::new(RefCell::new(VirtualLightBus::new(vec![VirtualLightModule::new(Address(0x41))])));
    let lights = LightController::new(bus.clone(), Address(0x41));

    let mut delay = RecordingDelay::new();
    let summary = lights.run_demo_sequence(&mut delay).unwrap();
    assert_eq!(0, summary.failures);

    let applied = sets(bus.borrow().module(0).commands());

    // 0 up to 15 and back down, each alone at full brightness.
    let sweep = (0..=15u8).chain((0..=15).rev()).map(|id| (true, id, 255)).collect::<Vec<_>>();
    assert_eq!(sweep, applied[..32]);

    // Then everything off.
    assert_eq!((true, 0, 0), applied[32]);

    // Then every light through the ramp, without resetting.
    let ramp = [5u8, 15, 25, 35, 45, 55, 65, 75, 85, 95, 145, 195, 245]
        .iter()
        .flat_map(|&duty| (0..=15u8).map(move |id| (false, id, duty)))
        .collect::<Vec<_>>();
    assert_eq!(ramp, applied[33..]);
    assert_eq!(summary.steps, applied.len());

    // Everything ends at the top of the ramp.
    assert!(bus.borrow().module(0).duties().iter().all(|&duty| duty == DutyCycle(245)));

    let pauses = delay.pauses();
    assert_eq!(32 + 13 * 16, pauses.len());
    assert!(pauses[..32].iter().all(|&pause| pause == Duration::from_millis(u64::from(SWEEP_PAUSE_MS))));
    assert!(pauses[32..].iter().all(|&pause| pause == Duration::from_millis(u64::from(RAMP_PAUSE_MS))));
}

#[test]
fn demo_continues_past_rejections() {
    let module = VirtualLightModule::new(Address(0x41)).rejecting(StatusCode::Other(-7));
    let bus = Rc::new(RefCell::new(VirtualLightBus::new(vec![module])));
    let lights = LightController::new(bus.clone(), Address(0x41));

    let summary = lights.run_demo_sequence(&mut RecordingDelay::new()).unwrap();
    assert_eq!(demo::steps().count(), summary.steps);
    assert_eq!(summary.steps, summary.failures);
    assert_eq!(summary.steps, sets(bus.borrow().module(0).commands()).len());
}

#[test]
fn demo_fail_fast_stops() {
    let module = VirtualLightModule::new(Address(0x41)).rejecting(StatusCode::UnrecognizedCommand);
    let bus = Rc::new(RefCell::new(VirtualLightBus::new(vec![module])));
    let lights = LightController::new(bus.clone(), Address(0x41));

    let mut delay = RecordingDelay::new();
    let error = demo::run(&lights, &mut delay, DemoOptions { fail_fast: true }).unwrap_err();
    assert!(matches!(error, LightError::DeviceRejected(StatusCode::UnrecognizedCommand)));
    assert_eq!(1, bus.borrow().module(0).commands().len());
    assert!(delay.pauses().is_empty());
}

#[test]
fn hub_bring_up() {
    let bus = VirtualLightBus::new(vec![VirtualLightModule::new(Address(0x41)).with_groups(groups())]);
    let bus = Rc::new(RefCell::new(bus));

    let lights = hub::bring_up(&LightsConfig::default(), bus.clone()).unwrap();
    assert_eq!(Readiness::Ready, lights.readiness());

    let disabled = LightsConfig {
        enabled: false,
        ..Default::default()
    };
    bus.borrow_mut().clear_history();
    assert!(hub::bring_up(&disabled, bus.clone()).is_none());
    assert_eq!(0, bus.borrow().transaction_count());
}

#[test]
fn hub_bring_up_disables_on_version_mismatch() {
    let bus = VirtualLightBus::new(vec![VirtualLightModule::new(Address(0x41)).with_version("9.9.9")]);
    let bus = Rc::new(RefCell::new(bus));

    assert!(hub::bring_up(&LightsConfig::default(), bus.clone()).is_none());

    // Only discovery queries went out; no light was ever set.
    let commands = bus.borrow().module(0).commands().to_vec();
    assert_eq!(vec![Command::Query(Query::ModuleId), Command::Query(Query::Version)], commands);
}

#[test]
fn web_pages() {
    let bus = Rc::new(RefCell::new(VirtualLightBus::new(vec![VirtualLightModule::new(Address(0x41))])));
    let lights = hub::bring_up(&LightsConfig::default(), bus.clone());
    assert!(lights.is_some());

    let mut delay = RecordingDelay::new();
    let mut context = HubContext::new(lights, &mut delay);

    let get = Request {
        method: Method::Get,
        path: "/",
        body: "",
    };
    let page = web::dispatch(&mut context, &get).unwrap();
    assert!(page.contains(r#"name="r" type="number" value="0""#));

    let post = Request {
        method: Method::Post,
        path: "/",
        body: "r=12&g=34&b=56",
    };
    let page = web::dispatch(&mut context, &post).unwrap();
    assert!(page.contains(r#"value="12""#));
    assert!(page.contains(r#"value="34""#));
    assert!(page.contains(r#"value="56""#));

    // Form state is per request, so a later GET shows zeros again.
    let page = web::dispatch(&mut context, &get).unwrap();
    assert!(page.contains(r#"name="g" type="number" value="0""#));

    assert!(sets(bus.borrow().module(0).commands()).is_empty());

    let demo = Request {
        method: Method::Post,
        path: "/",
        body: "r=255&g=0&b=0",
    };
    let _ = web::dispatch(&mut context, &demo).unwrap();
    assert_eq!(demo::steps().count(), sets(bus.borrow().module(0).commands()).len());

    let missing = Request {
        method: Method::Get,
        path: "/nope",
        body: "",
    };
    assert_eq!(None, web::dispatch(&mut context, &missing));
}

#[test]
fn web_demo_without_lights() {
    let mut delay = RecordingDelay::new();
    let mut context = HubContext::new(None, &mut delay);

    let demo = Request {
        method: Method::Post,
        path: "/",
        body: "r=255",
    };
    let page = web::dispatch(&mut context, &demo).unwrap();
    assert!(page.contains(r#"value="255""#));
    assert!(delay.pauses().is_empty());
}
