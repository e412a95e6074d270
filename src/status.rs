//! Status LED driven by the radio session state.
//!
//!   - Scanning   - slow blink
//!   - Connecting - fast blink
//!   - Connected  - solid on
//!   - otherwise  - off

use ble_autoconnect::config::{LED_CONNECT_BLINK_MS, LED_SCAN_BLINK_MS};
use ble_autoconnect::SessionState;
use defmt::info;
use embassy_futures::select::{select, Either};
use embassy_nrf::gpio::Output;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Receiver;
use embassy_time::{Duration, Timer};

pub type StateReceiver = Receiver<'static, CriticalSectionRawMutex, SessionState, 4>;

/// Blink half-period for `state`, or `None` for a steady LED.
fn blink_period(state: SessionState) -> Option<u64> {
    match state {
        SessionState::Scanning => Some(LED_SCAN_BLINK_MS),
        SessionState::Connecting { .. } => Some(LED_CONNECT_BLINK_MS),
        _ => None,
    }
}

fn set_steady(led: &mut Output<'static>, state: SessionState) {
    // Active low.
    if matches!(state, SessionState::Connected { .. }) {
        led.set_low();
    } else {
        led.set_high();
    }
}

#[embassy_executor::task]
pub async fn status_task(mut led: Output<'static>, state_rx: StateReceiver) -> ! {
    let mut state = SessionState::Idle;
    set_steady(&mut led, state);

    loop {
        let next = match blink_period(state) {
            Some(ms) => match select(
                state_rx.receive(),
                Timer::after(Duration::from_millis(ms)),
            )
            .await
            {
                Either::First(next) => Some(next),
                Either::Second(()) => {
                    led.toggle();
                    None
                }
            },
            None => Some(state_rx.receive().await),
        };

        if let Some(next) = next {
            if next != state {
                info!("status: {:?}", next);
                state = next;
                set_steady(&mut led, state);
            }
        }
    }
}
