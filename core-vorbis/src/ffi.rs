//! # C ABI
//!
//! Pointer-slot interface for hosts that cannot observe Rust errors, such as
//! Emscripten-style JavaScript glue or C programs.
//!
//! The caller allocates every slot, binds them once in [`create_decoder`], and
//! before each header or decode call writes the packet bytes into the input
//! buffer and their length into the input-length slot. The decoder reads the
//! input, writes results into the bound slots and returns a status code:
//! `0` on success, otherwise the negative code of the error kind (see
//! [`ErrorKind::code`](crate::ErrorKind::code)).
//!
//! On failure the error slots receive a pointer to NUL-terminated error text
//! and its length. The text and the PCM plane pointers stay valid until the
//! next call on the same handle or until [`destroy_decoder`].
//!
//! The output, channel count, sample rate and samples-decoded slots are
//! required; [`create_decoder`] refuses to bind a null one. The error slots
//! may be null.
//!
//! Handles are non-zero integers resolved through a per-thread registry and
//! never reused. A call on a destroyed handle returns the `UseAfterDestroy`
//! code without touching any slot.
//!
//! # Safety
//!
//! All slot pointers passed to [`create_decoder`] must stay valid for writes
//! (and the input buffer for reads of `*input_len` bytes) until
//! [`destroy_decoder`] is called. Calls on one handle must come from the
//! thread that created it.

use crate::config::DecoderConfig;
use crate::decoder::{OutputSlots, VorbisDecoder};
use crate::error::{DecoderError, Result};
use crate::packet::PageInfo;
use std::cell::RefCell;
use std::collections::HashMap;
use std::ffi::CString;
use std::os::raw::{c_char, c_int, c_long};
use tracing::{debug, warn};

/// Status returned by every call that succeeds.
pub const VORBIS_OK: c_int = 0;

/// Handle value that never refers to a session.
pub const INVALID_HANDLE: u32 = 0;

/// Caller-owned memory bound at creation.
struct BoundSlots {
    input: *const u8,
    input_len: *const c_int,
    output: *mut *mut *mut f32,
    channels: *mut c_int,
    sample_rate: *mut c_long,
    samples_decoded: *mut c_int,
    errors: *mut *const c_char,
    errors_len: *mut c_int,
}

impl BoundSlots {
    /// Name of the first required output slot that is null.
    fn null_output_slot(&self) -> Option<&'static str> {
        if self.output.is_null() {
            Some("output")
        } else if self.channels.is_null() {
            Some("channels")
        } else if self.sample_rate.is_null() {
            Some("sample_rate")
        } else if self.samples_decoded.is_null() {
            Some("samples_decoded")
        } else {
            None
        }
    }
}

struct FfiSession {
    decoder: VorbisDecoder,
    slots: BoundSlots,
    out: OutputSlots,
    pcm_ptrs: Vec<*mut f32>,
    error_text: Option<CString>,
}

#[derive(Default)]
struct Registry {
    sessions: HashMap<u32, FfiSession>,
    last_id: u32,
}

thread_local! {
    static REGISTRY: RefCell<Registry> = RefCell::new(Registry::default());
}

impl FfiSession {
    /// Translate a call result into a status code, writing error text on failure.
    fn report(&mut self, result: Result<()>) -> c_int {
        match result {
            Ok(()) => VORBIS_OK,
            Err(e) => {
                self.write_error(&e);
                e.code()
            }
        }
    }

    fn write_error(&mut self, err: &DecoderError) {
        let message = err.to_string();
        let text = self
            .decoder
            .config()
            .truncate_error_text(&message)
            .replace('\0', " ");
        let text = CString::new(text).unwrap_or_default();
        let len = c_int::try_from(text.as_bytes().len()).unwrap_or(c_int::MAX);

        // SAFETY: slots are valid for writes per the `create_decoder` contract.
        unsafe {
            if !self.slots.errors.is_null() {
                *self.slots.errors = text.as_ptr();
            }
            if !self.slots.errors_len.is_null() {
                *self.slots.errors_len = len;
            }
        }
        self.error_text = Some(text);
    }

    fn write_stream_params(&self) -> Result<()> {
        if self.out.channels == 0 {
            return Ok(());
        }

        let sample_rate = c_long::try_from(self.out.sample_rate).map_err(|_| {
            DecoderError::InvalidArgument(format!(
                "sample rate {} does not fit the output slot",
                self.out.sample_rate
            ))
        })?;

        // SAFETY: non-null since `create_decoder`; valid for writes per its contract.
        unsafe {
            *self.slots.channels = self.out.channels as c_int;
            *self.slots.sample_rate = sample_rate;
        }
        Ok(())
    }

    fn publish_pcm(&mut self) -> Result<()> {
        let samples = c_int::try_from(self.out.samples_decoded).map_err(|_| {
            DecoderError::InvalidArgument(format!(
                "{} samples do not fit the output slot",
                self.out.samples_decoded
            ))
        })?;

        self.pcm_ptrs.clear();
        self.pcm_ptrs
            .extend(self.out.channel_data.iter_mut().map(|plane| plane.as_mut_ptr()));

        // SAFETY: non-null since `create_decoder`; valid for writes per its contract.
        unsafe {
            *self.slots.output = self.pcm_ptrs.as_mut_ptr();
            *self.slots.samples_decoded = samples;
        }
        self.write_stream_params()
    }
}

/// Borrow the caller's input buffer for the duration of one call.
///
/// # Safety
///
/// `input_len` must be null or readable, and `input` must be null or
/// readable for `*input_len` bytes until the current call returns.
unsafe fn input_slice<'a>(input: *const u8, input_len: *const c_int) -> Result<&'a [u8]> {
    if input_len.is_null() {
        return Err(DecoderError::InvalidArgument(
            "input length slot is null".to_string(),
        ));
    }

    let len = unsafe { *input_len };
    let len = usize::try_from(len)
        .map_err(|_| DecoderError::InvalidArgument(format!("negative input length {}", len)))?;
    if len == 0 {
        return Ok(&[]);
    }
    if input.is_null() {
        return Err(DecoderError::InvalidArgument(
            "input buffer is null".to_string(),
        ));
    }

    Ok(unsafe { std::slice::from_raw_parts(input, len) })
}

/// Run `op` against the session behind `handle` and report its outcome.
fn with_session(handle: u32, op: impl FnOnce(&mut FfiSession) -> Result<()>) -> c_int {
    REGISTRY.with(|registry| {
        let mut registry = registry.borrow_mut();
        let last_id = registry.last_id;
        match registry.sessions.get_mut(&handle) {
            Some(session) => {
                let result = op(session);
                session.report(result)
            }
            None if handle != INVALID_HANDLE && handle <= last_id => {
                warn!(handle, "Call on destroyed decoder handle");
                DecoderError::UseAfterDestroy.code()
            }
            None => {
                warn!(handle, "Call on unknown decoder handle");
                DecoderError::InvalidArgument(format!("unknown decoder handle {}", handle)).code()
            }
        }
    })
}

fn page_info(first_page_flag: c_long, last_page_flag: c_long, granulepos: i64) -> PageInfo {
    PageInfo::new(first_page_flag != 0, last_page_flag != 0, granulepos)
}

/// Create a decode session bound to caller-owned slots.
///
/// Returns a non-zero handle, or `0` if a required output slot is null or no
/// session could be created. The input is not read until the first header
/// call.
///
/// # Safety
///
/// Every non-null pointer must stay valid until [`destroy_decoder`] is called
/// on the returned handle; see the module documentation.
#[no_mangle]
pub unsafe extern "C" fn create_decoder(
    input: *const u8,
    input_len: *const c_int,
    output: *mut *mut *mut f32,
    channels: *mut c_int,
    sample_rate: *mut c_long,
    samples_decoded: *mut c_int,
    errors: *mut *const c_char,
    errors_len: *mut c_int,
) -> u32 {
    let slots = BoundSlots {
        input,
        input_len,
        output,
        channels,
        sample_rate,
        samples_decoded,
        errors,
        errors_len,
    };
    if let Some(slot) = slots.null_output_slot() {
        warn!(slot, "Refusing to bind a null output slot");
        return INVALID_HANDLE;
    }

    let decoder = match VorbisDecoder::new(DecoderConfig::default()) {
        Ok(decoder) => decoder,
        Err(e) => {
            warn!(error = %e, "Failed to create decoder");
            return INVALID_HANDLE;
        }
    };

    let session = FfiSession {
        decoder,
        slots,
        out: OutputSlots::new(),
        pcm_ptrs: Vec::new(),
        error_text: None,
    };

    REGISTRY.with(|registry| {
        let mut registry = registry.borrow_mut();
        let Some(id) = registry.last_id.checked_add(1) else {
            warn!("Decoder handle space exhausted");
            return INVALID_HANDLE;
        };
        registry.last_id = id;
        registry.sessions.insert(id, session);
        debug!(handle = id, "Decoder created");
        id
    })
}

/// Submit the packet in the input buffer as the next header packet.
///
/// On the identification header the channel count and sample rate slots are
/// written immediately.
///
/// # Safety
///
/// `handle` must have been created on this thread; the bound slots must
/// still be valid.
#[no_mangle]
pub unsafe extern "C" fn send_setup(
    handle: u32,
    first_page_flag: c_long,
    last_page_flag: c_long,
    granulepos: i64,
) -> c_int {
    with_session(handle, |session| {
        // SAFETY: input slots are valid for reads per the `create_decoder` contract.
        let packet = unsafe { input_slice(session.slots.input, session.slots.input_len)? };
        let page = page_info(first_page_flag, last_page_flag, granulepos);
        session
            .decoder
            .submit_header_packet(packet, page, &mut session.out)?;
        session.write_stream_params()
    })
}

/// Build the codec engine once all three headers were submitted.
///
/// # Safety
///
/// `handle` must have been created on this thread; the bound slots must
/// still be valid.
#[no_mangle]
pub unsafe extern "C" fn init_dsp(handle: u32) -> c_int {
    with_session(handle, |session| session.decoder.init_dsp())
}

/// Decode the packet in the input buffer.
///
/// On success `*output` points at one `f32` plane per channel holding
/// `*samples_decoded` samples each. On failure the output slots keep their
/// previous values.
///
/// # Safety
///
/// `handle` must have been created on this thread; the bound slots must
/// still be valid.
#[no_mangle]
pub unsafe extern "C" fn decode_packets(
    handle: u32,
    first_page_flag: c_long,
    last_page_flag: c_long,
    granulepos: i64,
) -> c_int {
    with_session(handle, |session| {
        // SAFETY: input slots are valid for reads per the `create_decoder` contract.
        let packet = unsafe { input_slice(session.slots.input, session.slots.input_len)? };
        let page = page_info(first_page_flag, last_page_flag, granulepos);
        session
            .decoder
            .decode_packets(packet, page, &mut session.out)?;
        session.publish_pcm()
    })
}

/// Destroy a decode session.
///
/// Caller-owned slots are left untouched, but PCM and error text pointers
/// previously written into them dangle afterwards. Destroying an unknown or
/// already destroyed handle does nothing.
///
/// # Safety
///
/// `handle` must have been created on this thread.
#[no_mangle]
pub unsafe extern "C" fn destroy_decoder(handle: u32) {
    let session = REGISTRY.with(|registry| registry.borrow_mut().sessions.remove(&handle));
    match session {
        Some(mut session) => {
            if let Err(e) = session.decoder.destroy() {
                warn!(handle, error = %e, "Decoder destroy reported an error");
            }
            session.pcm_ptrs.clear();
            session.error_text = None;
            debug!(handle, "Decoder destroyed");
        }
        None => warn!(handle, "destroy_decoder on unknown or destroyed handle"),
    }
}
