//! WebAssembly bindings for core-vorbis
//!
//! Exposes a decode session to JavaScript as `OggVorbisDecoder`. Packets are
//! passed as `Uint8Array`s with their page flags; PCM comes back as one
//! `Float32Array` per channel. Errors are thrown as strings.
//!
//! Console logging is enabled through `enableConsoleLogging`, exported by
//! core-runtime.

use crate::config::DecoderConfig;
use crate::decoder::{OutputSlots, VorbisDecoder};
use crate::packet::PageInfo;
use js_sys::{Array, Float32Array, Object, Reflect};
use tracing::debug;
use wasm_bindgen::prelude::*;

fn to_js_error<E: std::fmt::Display>(err: E) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// JavaScript-accessible Ogg Vorbis decode session
#[wasm_bindgen(js_name = OggVorbisDecoder)]
pub struct JsOggVorbisDecoder {
    config: DecoderConfig,
    decoder: VorbisDecoder,
    out: OutputSlots,
}

#[wasm_bindgen(js_class = OggVorbisDecoder)]
impl JsOggVorbisDecoder {
    /// Create a decoder. `configJson` may override `DecoderConfig` fields.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> Result<JsOggVorbisDecoder, JsValue> {
        console_error_panic_hook::set_once();

        let config = match config_json {
            Some(json) => DecoderConfig::from_json_str(&json).map_err(to_js_error)?,
            None => DecoderConfig::default(),
        };
        let decoder = VorbisDecoder::new(config.clone()).map_err(to_js_error)?;

        Ok(Self {
            config,
            decoder,
            out: OutputSlots::new(),
        })
    }

    /// Submit the next header packet (identification, comment, setup).
    ///
    /// Granule positions are JavaScript numbers; negative means unset.
    #[wasm_bindgen(js_name = sendSetup)]
    pub fn send_setup(
        &mut self,
        data: &[u8],
        first_page: bool,
        last_page: bool,
        granule_position: f64,
    ) -> Result<(), JsValue> {
        let page = PageInfo::new(first_page, last_page, granule_position as i64);
        self.decoder
            .submit_header_packet(data, page, &mut self.out)
            .map(|_| ())
            .map_err(to_js_error)
    }

    #[wasm_bindgen(js_name = initDsp)]
    pub fn init_dsp(&mut self) -> Result<(), JsValue> {
        self.decoder.init_dsp().map_err(to_js_error)
    }

    /// Decode one audio packet.
    ///
    /// Returns `{ channelData: Float32Array[], samplesDecoded, sampleRate }`.
    #[wasm_bindgen(js_name = decodePackets)]
    pub fn decode_packets(
        &mut self,
        data: &[u8],
        first_page: bool,
        last_page: bool,
        granule_position: f64,
    ) -> Result<JsValue, JsValue> {
        let page = PageInfo::new(first_page, last_page, granule_position as i64);
        self.decoder
            .decode_packets(data, page, &mut self.out)
            .map_err(to_js_error)?;

        let channel_data = Array::new();
        for plane in &self.out.channel_data {
            channel_data.push(&Float32Array::from(plane.as_slice()));
        }

        let result = Object::new();
        Reflect::set(&result, &"channelData".into(), &channel_data)?;
        Reflect::set(
            &result,
            &"samplesDecoded".into(),
            &JsValue::from(self.out.samples_decoded as u32),
        )?;
        Reflect::set(
            &result,
            &"sampleRate".into(),
            &JsValue::from(self.out.sample_rate),
        )?;
        Ok(result.into())
    }

    pub fn channels(&self) -> u32 {
        self.out.channels
    }

    #[wasm_bindgen(js_name = sampleRate)]
    pub fn sample_rate(&self) -> u32 {
        self.out.sample_rate
    }

    /// Current session phase as text.
    pub fn phase(&self) -> String {
        self.decoder.phase().to_string()
    }

    /// Vendor string and comment entries, or `null` before the comment header.
    pub fn comment(&self) -> Result<JsValue, JsValue> {
        match self.decoder.comment() {
            Some(comment) => serde_wasm_bindgen::to_value(comment).map_err(to_js_error),
            None => Ok(JsValue::NULL),
        }
    }

    /// Session counters.
    pub fn stats(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(self.decoder.stats()).map_err(to_js_error)
    }

    /// Destroy the current session and start a fresh one with the same
    /// configuration.
    pub fn reset(&mut self) -> Result<(), JsValue> {
        if let Err(e) = self.decoder.destroy() {
            debug!(error = %e, "Replacing an already destroyed session");
        }
        self.decoder = VorbisDecoder::new(self.config.clone()).map_err(to_js_error)?;
        self.out = OutputSlots::new();
        Ok(())
    }

    /// Release the codec engine. Later calls throw.
    pub fn destroy(&mut self) -> Result<(), JsValue> {
        self.decoder.destroy().map_err(to_js_error)
    }
}
