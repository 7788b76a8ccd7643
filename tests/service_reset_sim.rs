use remote_diagnostics::{
    gateway::{
        simulation::SimulationGateway, BusConfig, GatewayClient, GatewaySession, SessionOutcome,
        SessionState, TicketId,
    },
    vehicle::service_reset::{perform_service_reset, ResetPeriod, CNG_MODULE},
};

const BUS: &str = "vag_bus";
const REQ: u32 = 0x0714;

fn map_ident(gateway: &SimulationGateway, did: u16, value: &[u8]) {
    let did = did.to_be_bytes();
    gateway.add_response(
        REQ,
        &[0x22, did[0], did[1]],
        &[[0x62, did[0], did[1]].as_slice(), value].concat(),
    );
}

fn map_reset_ecu(gateway: &SimulationGateway, period_interval: &[u8]) {
    map_ident(gateway, 0xF19E, b"KOMBI J285");
    map_ident(gateway, 0xF1A2, b"0561");
    map_ident(gateway, 0xF190, b"WVWZZZ1KZAW123456");
    gateway.add_response(REQ, &[0x10, 0x03], &[0x50, 0x03]);
    gateway.add_response(
        REQ,
        &[0x2E, 0xF1, 0x98, 0x80, 0x00, 0x00, 0x0E, 0x5D, 0x23],
        &[0x6E, 0xF1, 0x98],
    );
    gateway.add_response(
        REQ,
        &[0x2E, 0xF1, 0x99, 0x25, 0x04, 0x09],
        &[0x6E, 0xF1, 0x99],
    );
    gateway.add_response(
        REQ,
        &[[0x2E, 0x0C, 0x34].as_slice(), period_interval].concat(),
        &[0x6E, 0x0C, 0x34],
    );
}

#[test]
fn two_year_reset_verifies_by_reading_back() {
    let _ = env_logger::try_init();
    let mut gateway = SimulationGateway::new();
    map_reset_ecu(&gateway, &[0x02, 0xDA]);
    // Counter reads 12 days remaining before the reset, 730 after
    gateway.add_response_sequence(
        REQ,
        &[0x22, 0x0C, 0x38],
        &[&[0x62, 0x0C, 0x38, 0x00, 0x0C], &[0x62, 0x0C, 0x38, 0x02, 0xDA]],
    );

    let ticket = TicketId::new("8066797").unwrap();
    let mut session = gateway.open_ticket(&ticket).unwrap();
    session
        .configure_buses(&[BusConfig::powertrain(BUS)])
        .unwrap();

    let outcome = perform_service_reset(&mut session, BUS, ResetPeriod::TwoYears).unwrap();
    assert!(outcome.succeeded());
    assert_eq!(outcome.pre_reset_days, Some(12));
    assert_eq!(outcome.post_reset_days, Some(730));
    assert_eq!(outcome.vin.as_deref(), Some("WVWZZZ1KZAW123456"));
    assert_eq!(outcome.brand.as_deref(), Some("Volkswagen"));
    assert_eq!(outcome.ecu_type.as_deref(), Some("KOMBI J285"));

    session.finish(SessionOutcome::Success).unwrap();
}

#[test]
fn four_year_reset_writes_1460_days() {
    let mut gateway = SimulationGateway::new();
    map_reset_ecu(&gateway, &[0x05, 0xB4]);
    gateway.add_response(REQ, &[0x22, 0x0C, 0x38], &[0x62, 0x0C, 0x38, 0x05, 0xB4]);

    let ticket = TicketId::new("1").unwrap();
    let mut session = gateway.open_ticket(&ticket).unwrap();
    session
        .configure_buses(&[BusConfig::powertrain(BUS)])
        .unwrap();

    let outcome = perform_service_reset(&mut session, BUS, ResetPeriod::FourYears).unwrap();
    assert!(outcome.succeeded());
    assert_eq!(outcome.post_reset_days, Some(1460));
}

#[test]
fn unreadable_counter_fails_verification() {
    let mut gateway = SimulationGateway::new();
    // ECU answers ident reads and accepts the write, but the counter read
    // is rejected, so the reset cannot be verified
    map_ident(&gateway, 0xF190, b"WVWZZZ1KZAW123456");
    gateway.add_response(REQ, &[0x10, 0x03], &[0x50, 0x03]);
    gateway.add_response(REQ, &[0x22, 0x0C, 0x38], &[0x7F, 0x22, 0x31]);
    gateway.add_response(
        REQ,
        &[0x2E, 0x0C, 0x34, 0x02, 0xDA],
        &[0x6E, 0x0C, 0x34],
    );

    let ticket = TicketId::new("2").unwrap();
    let mut session = gateway.open_ticket(&ticket).unwrap();
    session
        .configure_buses(&[BusConfig::powertrain(BUS)])
        .unwrap();

    let outcome = perform_service_reset(&mut session, BUS, ResetPeriod::TwoYears).unwrap();
    assert!(!outcome.succeeded());
    assert_eq!(outcome.pre_reset_days, None);
    assert_eq!(outcome.post_reset_days, None);
}

#[test]
fn session_lifecycle_listing_and_interrupt() {
    let mut gateway = SimulationGateway::new();
    let ticket = TicketId::new("555").unwrap();
    let session = gateway.open_ticket(&ticket).unwrap();

    let active = gateway.active_sessions().unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].state, SessionState::Active);

    let id = active[0].id.clone();
    gateway.interrupt_session(&id).unwrap();
    assert!(gateway.active_sessions().unwrap().is_empty());
    assert!(gateway.interrupt_session("no-such-session").is_err());

    drop(session);
}

#[test]
fn sockets_on_unconfigured_buses_are_rejected() {
    let mut gateway = SimulationGateway::new();
    let ticket = TicketId::new("3").unwrap();
    let mut session = gateway.open_ticket(&ticket).unwrap();
    // configure_buses never called for this bus name
    let result = session.isotp_socket(
        remote_diagnostics::gateway::ChannelConfig::new(
            BUS,
            CNG_MODULE.request_id,
            CNG_MODULE.response_id,
        ),
    );
    assert!(result.is_err());
}
