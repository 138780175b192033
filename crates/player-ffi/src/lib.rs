// C ABI bridge for liteplay
//
// Every player lives in a process-wide registry keyed by an integer id.
// Transitions queue up on the player's event channel and are handed to the
// native listener one at a time with the registry unlocked, so a listener may
// call straight back into the player (e.g. start on Prepared). Only the
// outermost call delivers; nested calls just queue, which keeps the listener
// seeing transitions in the order they happened.

use crossbeam_channel::{Receiver, Select};
use liteplay_core::{
    PlaybackController, PlayerError, PlayerEvent, PlayerState, Result, TransitionEvent,
};
use liteplay_engine::ClockEngine;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::ffi::{c_char, c_void, CStr};
use std::sync::Once;
use std::time::Duration;

pub const LITEPLAY_OK: i32 = 0;
pub const LITEPLAY_ERR_INVALID_STATE: i32 = -1;
pub const LITEPLAY_ERR_INVALID_SEEK_TARGET: i32 = -2;
pub const LITEPLAY_ERR_INVALID_DATA_SOURCE: i32 = -3;
pub const LITEPLAY_ERR_RELEASED: i32 = -4;
pub const LITEPLAY_ERR_PREPARE_FAILED: i32 = -5;

/// Native state listener: `(state, error_code, error_extra, user_data)`
///
/// `error_code`/`error_extra` are zero for every state but ERROR.
pub type StateListener = extern "C" fn(i32, i32, i32, *mut c_void);

#[derive(Clone, Copy)]
struct NativeListener {
    callback: StateListener,
    // Stored as an address so the registry stays Send
    user_data: usize,
}

impl NativeListener {
    fn deliver(&self, transition: &TransitionEvent) {
        let (code, extra) = match transition.event {
            PlayerEvent::Error { code, extra } => (code, extra),
            _ => (0, 0),
        };
        (self.callback)(
            transition.to.code(),
            code,
            extra,
            self.user_data as *mut c_void,
        );
    }
}

struct PlayerEntry {
    controller: PlaybackController,
    events: Receiver<TransitionEvent>,
    listener: Option<NativeListener>,
    /// A call further up the stack is draining `events`
    delivering: bool,
}

impl PlayerEntry {
    fn new(controller: PlaybackController) -> Self {
        let events = controller.subscribe();
        Self {
            controller,
            events,
            listener: None,
            delivering: false,
        }
    }
}

static PLAYER_REGISTRY: Lazy<Mutex<HashMap<i64, PlayerEntry>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));
static NEXT_PLAYER_ID: Lazy<Mutex<i64>> = Lazy::new(|| Mutex::new(1));
static INIT_LOGGER: Once = Once::new();

fn init_logging() {
    INIT_LOGGER.call_once(|| {
        #[cfg(target_os = "android")]
        {
            android_logger::init_once(
                android_logger::Config::default()
                    .with_max_level(log::LevelFilter::Debug)
                    .with_tag("Liteplay"),
            );
        }

        #[cfg(not(target_os = "android"))]
        {
            let _ = env_logger::Builder::from_env(
                env_logger::Env::default().default_filter_or("info"),
            )
            .try_init();
        }
    });
}

fn register_player(controller: PlaybackController) -> i64 {
    init_logging();
    let mut next = NEXT_PLAYER_ID.lock();
    let id = *next;
    *next += 1;
    drop(next);

    PLAYER_REGISTRY.lock().insert(id, PlayerEntry::new(controller));
    log::info!("player {} created", id);
    id
}

fn with_entry_mut<R>(id: i64, f: impl FnOnce(&mut PlayerEntry) -> Result<R>) -> Result<R> {
    let result = {
        let mut registry = PLAYER_REGISTRY.lock();
        let entry = registry.get_mut(&id).ok_or(PlayerError::Released)?;
        f(entry)
    };
    deliver_pending(id);
    result
}

/// Hand queued transitions to the listener, one per registry lock
fn deliver_pending(id: i64) {
    {
        let mut registry = PLAYER_REGISTRY.lock();
        match registry.get_mut(&id) {
            Some(entry) if !entry.delivering => entry.delivering = true,
            _ => return,
        }
    }

    loop {
        let next = {
            let mut registry = PLAYER_REGISTRY.lock();
            // Released from inside the listener; release delivered the rest
            let Some(entry) = registry.get_mut(&id) else {
                return;
            };
            match entry.events.try_recv() {
                Ok(transition) => (entry.listener, transition),
                Err(_) => {
                    entry.delivering = false;
                    return;
                }
            }
        };
        if let (Some(listener), transition) = next {
            listener.deliver(&transition);
        }
    }
}

fn with_player_mut<R>(
    id: i64,
    f: impl FnOnce(&mut PlaybackController) -> Result<R>,
) -> Result<R> {
    with_entry_mut(id, |entry| f(&mut entry.controller))
}

fn with_player<R>(id: i64, f: impl FnOnce(&PlaybackController) -> R) -> Result<R> {
    let registry = PLAYER_REGISTRY.lock();
    let entry = registry.get(&id).ok_or(PlayerError::Released)?;
    Ok(f(&entry.controller))
}

fn error_code(err: &PlayerError) -> i32 {
    match err {
        PlayerError::InvalidState { .. } => LITEPLAY_ERR_INVALID_STATE,
        PlayerError::InvalidSeekTarget { .. } => LITEPLAY_ERR_INVALID_SEEK_TARGET,
        PlayerError::InvalidDataSource(_) => LITEPLAY_ERR_INVALID_DATA_SOURCE,
        PlayerError::Released => LITEPLAY_ERR_RELEASED,
    }
}

fn to_code(result: Result<()>) -> i32 {
    match result {
        Ok(()) => LITEPLAY_OK,
        Err(err) => {
            log::error!("FFI error: {}", err);
            error_code(&err)
        }
    }
}

// -------------------------------
// C ABI
// -------------------------------

/// Create a player backed by the clock engine; returns its id
#[no_mangle]
pub extern "C" fn liteplay_create() -> i64 {
    register_player(PlaybackController::new(ClockEngine::new()))
}

#[no_mangle]
pub extern "C" fn liteplay_register_state_listener(
    player_id: i64,
    listener: Option<StateListener>,
    user_data: *mut c_void,
) -> i32 {
    to_code(with_entry_mut(player_id, |entry| {
        entry.listener = listener.map(|callback| NativeListener {
            callback,
            user_data: user_data as usize,
        });
        Ok(())
    }))
}

#[no_mangle]
pub extern "C" fn liteplay_set_data_source(player_id: i64, locator: *const c_char) -> i32 {
    if locator.is_null() {
        return LITEPLAY_ERR_INVALID_DATA_SOURCE;
    }
    let c_str = unsafe { CStr::from_ptr(locator) };
    match c_str.to_str() {
        Ok(locator) => to_code(with_player_mut(player_id, |p| p.set_data_source(locator))),
        Err(_) => LITEPLAY_ERR_INVALID_DATA_SOURCE,
    }
}

#[no_mangle]
pub extern "C" fn liteplay_prepare_async(player_id: i64) -> i32 {
    to_code(with_player_mut(player_id, |p| p.prepare_async()))
}

/// Prepare and block until the player has left PREPARING
///
/// The registry is not held while waiting; the listener sees PREPARED or
/// ERROR before this returns. A failed prepare yields
/// `LITEPLAY_ERR_PREPARE_FAILED`.
#[no_mangle]
pub extern "C" fn liteplay_prepare(player_id: i64) -> i32 {
    let code = to_code(with_player_mut(player_id, |p| p.prepare_async()));
    if code != LITEPLAY_OK {
        return code;
    }

    loop {
        let (state, notifications) =
            match with_player(player_id, |p| (p.state(), p.notifications().clone())) {
                Ok(snapshot) => snapshot,
                Err(err) => return error_code(&err),
            };
        match state {
            PlayerState::Preparing => {}
            // The listener may already have started playback
            state if state.is_prepared() => return LITEPLAY_OK,
            _ => return LITEPLAY_ERR_PREPARE_FAILED,
        }
        wait_for_notification(&notifications, Duration::from_millis(50));
        if let Err(err) = with_player_mut(player_id, |p| Ok(p.pump())) {
            return error_code(&err);
        }
    }
}

#[no_mangle]
pub extern "C" fn liteplay_start(player_id: i64) -> i32 {
    to_code(with_player_mut(player_id, |p| p.start()))
}

#[no_mangle]
pub extern "C" fn liteplay_pause(player_id: i64) -> i32 {
    to_code(with_player_mut(player_id, |p| p.pause()))
}

#[no_mangle]
pub extern "C" fn liteplay_resume(player_id: i64) -> i32 {
    to_code(with_player_mut(player_id, |p| p.resume()))
}

#[no_mangle]
pub extern "C" fn liteplay_seek_to(player_id: i64, position_ms: i64) -> i32 {
    to_code(with_player_mut(player_id, |p| p.seek_to(position_ms)))
}

/// Stop playback; the data source stays bound and can be prepared again
#[no_mangle]
pub extern "C" fn liteplay_stop(player_id: i64) -> i32 {
    to_code(with_player_mut(player_id, |p| p.stop()))
}

#[no_mangle]
pub extern "C" fn liteplay_reset(player_id: i64) -> i32 {
    to_code(with_player_mut(player_id, |p| p.reset()))
}

/// Apply engine notifications, waiting up to `timeout_ms` for the first one.
/// Returns the number of transitions fired or a negative error code.
#[no_mangle]
pub extern "C" fn liteplay_pump(player_id: i64, timeout_ms: i32) -> i32 {
    if timeout_ms > 0 {
        // Wait outside the registry lock so other players stay usable
        let notifications = match with_player(player_id, |p| p.notifications().clone()) {
            Ok(rx) => rx,
            Err(err) => return error_code(&err),
        };
        wait_for_notification(&notifications, Duration::from_millis(timeout_ms as u64));
    }

    match with_player_mut(player_id, |p| Ok(p.pump())) {
        Ok(applied) => applied as i32,
        Err(err) => error_code(&err),
    }
}

#[no_mangle]
pub extern "C" fn liteplay_get_position(player_id: i64) -> i64 {
    match with_player(player_id, |p| p.current_position()) {
        Ok(position) => position as i64,
        Err(err) => {
            log::error!("Failed to get position: {}", err);
            LITEPLAY_ERR_RELEASED as i64
        }
    }
}

#[no_mangle]
pub extern "C" fn liteplay_get_duration(player_id: i64) -> i64 {
    match with_player(player_id, |p| p.duration()) {
        Ok(duration) => duration as i64,
        Err(err) => {
            log::error!("Failed to get duration: {}", err);
            LITEPLAY_ERR_RELEASED as i64
        }
    }
}

#[no_mangle]
pub extern "C" fn liteplay_get_state(player_id: i64) -> i32 {
    match with_player(player_id, |p| p.state()) {
        Ok(state) => state.code(),
        Err(err) => {
            log::error!("Failed to get state: {}", err);
            LITEPLAY_ERR_RELEASED
        }
    }
}

fn wait_for_notification<T>(notifications: &Receiver<T>, timeout: Duration) {
    let mut select = Select::new();
    select.recv(notifications);
    let _ = select.ready_timeout(timeout);
}

/// Release the player and forget its id; releasing twice returns an error
#[no_mangle]
pub extern "C" fn liteplay_release(player_id: i64) -> i32 {
    let entry = PLAYER_REGISTRY.lock().remove(&player_id);
    match entry {
        Some(mut entry) => {
            entry.controller.release();
            if let Some(listener) = entry.listener {
                for transition in entry.events.try_iter() {
                    listener.deliver(&transition);
                }
            }
            log::info!("player {} released", player_id);
            LITEPLAY_OK
        }
        None => LITEPLAY_ERR_RELEASED,
    }
}
