//! ble-autoconnect firmware entry point (nRF52840 + S140 SoftDevice).
//!
//! Brings up the SoftDevice, checks that an identity address is available,
//! then hands the radio to `ble_task`, which scans for the configured peer
//! and connects to it. `status_task` mirrors progress on LED1.

#![no_std]
#![no_main]

mod radio;
mod status;

use core::mem;

use ble_autoconnect::config::{ATT_MTU, DEVICE_NAME, TARGET_PEER_ADDRESS};
use ble_autoconnect::{
    ConfigError, EventDispatcher, HostStack, ScanConnectController, SessionState,
    TargetConfiguration,
};
use defmt::{info, panic, unwrap};
use embassy_executor::Spawner;
use embassy_nrf::gpio::{Level, Output, OutputDrive};
use embassy_nrf::interrupt::Priority;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use nrf_softdevice::{raw, Softdevice};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use radio::SoftdeviceStack;

static STATE_CHANNEL: StaticCell<Channel<CriticalSectionRawMutex, SessionState, 4>> =
    StaticCell::new();

#[embassy_executor::task]
async fn softdevice_task(sd: &'static Softdevice) -> ! {
    sd.run().await
}

fn softdevice_config() -> nrf_softdevice::Config {
    nrf_softdevice::Config {
        clock: Some(raw::nrf_clock_lf_cfg_t {
            source: raw::NRF_CLOCK_LF_SRC_RC as u8,
            rc_ctiv: 16,
            rc_temp_ctiv: 2,
            accuracy: raw::NRF_CLOCK_LF_ACCURACY_500_PPM as u8,
        }),
        conn_gap: Some(raw::ble_gap_conn_cfg_t {
            conn_count: 1,
            event_length: 6,
        }),
        conn_gatt: Some(raw::ble_gatt_conn_cfg_t { att_mtu: ATT_MTU }),
        gatts_attr_tab_size: Some(raw::ble_gatts_cfg_attr_tab_size_t {
            attr_tab_size: raw::BLE_GATTS_ATTR_TAB_SIZE_DEFAULT,
        }),
        // Central only: one link, no peripheral role.
        gap_role_count: Some(raw::ble_gap_cfg_role_count_t {
            adv_set_count: 1,
            periph_role_count: 0,
            central_role_count: 1,
            central_sec_count: 0,
            _bitfield_1: raw::ble_gap_cfg_role_count_t::new_bitfield_1(0),
        }),
        gap_device_name: Some(raw::ble_gap_cfg_device_name_t {
            p_value: DEVICE_NAME.as_ptr() as _,
            current_len: DEVICE_NAME.len() as u16,
            max_len: DEVICE_NAME.len() as u16,
            write_perm: unsafe { mem::zeroed() },
            _bitfield_1: raw::ble_gap_cfg_device_name_t::new_bitfield_1(
                raw::BLE_GATTS_VLOC_STACK as u8,
            ),
        }),
        ..Default::default()
    }
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("ble-autoconnect starting");

    // Interrupt priorities 0, 1 and 4 belong to the SoftDevice.
    let mut nrf_config = embassy_nrf::config::Config::default();
    nrf_config.gpiote_interrupt_priority = Priority::P2;
    nrf_config.time_interrupt_priority = Priority::P2;
    let p = embassy_nrf::init(nrf_config);

    let target = match TargetConfiguration::parse(TARGET_PEER_ADDRESS) {
        Ok(target) => target,
        Err(e) => panic!("{}", e),
    };

    let sd = Softdevice::enable(&softdevice_config());
    unwrap!(spawner.spawn(softdevice_task(sd)));

    let mut stack = SoftdeviceStack::new();
    if let Err(e) = stack.infer_local_address_type() {
        panic!("{}", ConfigError::HostBringUp(e.code));
    }

    let dispatcher = EventDispatcher::new(ScanConnectController::new(target), stack);

    let channel: &'static Channel<CriticalSectionRawMutex, SessionState, 4> =
        STATE_CHANNEL.init(Channel::new());
    let led = Output::new(p.P0_13, Level::High, OutputDrive::Standard);

    unwrap!(spawner.spawn(status::status_task(led, channel.receiver())));
    unwrap!(spawner.spawn(radio::ble_task(sd, dispatcher, channel.sender())));
}
