//! DNS wire-format helpers.
//!
//! The header-level functions in this module work directly on raw bytes so
//! that messages can be forwarded without a full decode. Functions that
//! need to understand records live in [`message`].

pub mod message;

pub use message::{TtlPolicy, age_response, cache_ttl, client_payload_limit, truncate_for_client};

use crate::error::AppError;
use crate::result::AppResult;

/// Length of the fixed DNS message header.
pub const HEADER_LEN: usize = 12;

/// Smallest UDP payload every DNS client must accept.
pub const MIN_UDP_PAYLOAD: usize = 512;

const FLAG_QR: u8 = 0b1000_0000;
const MASK_OPCODE: u8 = 0b0111_1000;
const FLAG_RD: u8 = 0b0000_0001;
const FLAG_RA: u8 = 0b1000_0000;
const RCODE_SERVFAIL: u8 = 2;

/// Extracts the transaction ID from a message encoded in DNS wire format.
pub fn txid(message: &[u8]) -> AppResult<u16> {
    match message {
        [hi, lo, ..] => Ok(u16::from_be_bytes([*hi, *lo])),
        _ => Err(AppError::protocol(format!(
            "message of {} bytes is too short to carry a transaction ID",
            message.len()
        ))),
    }
}

/// Overwrites the transaction ID of a message encoded in DNS wire format.
pub fn set_txid(message: &mut [u8], txid: u16) -> AppResult<()> {
    if message.len() < 2 {
        return Err(AppError::protocol(format!(
            "message of {} bytes is too short to carry a transaction ID",
            message.len()
        )));
    }
    message[0..2].copy_from_slice(&txid.to_be_bytes());
    Ok(())
}

/// Whether the QR bit marks this message as a response.
pub fn is_response(message: &[u8]) -> bool {
    message.len() > 2 && message[2] & FLAG_QR != 0
}

/// Builds a header-only SERVFAIL answer to `request`.
///
/// Only the header is read, so this works for queries that fail to decode.
pub fn servfail_for(request: &[u8]) -> AppResult<Vec<u8>> {
    if request.len() < HEADER_LEN {
        return Err(AppError::protocol(format!(
            "request of {} bytes is shorter than the DNS header",
            request.len()
        )));
    }

    let mut response = vec![0u8; HEADER_LEN];
    response[0..2].copy_from_slice(&request[0..2]);
    response[2] = FLAG_QR | (request[2] & MASK_OPCODE) | (request[2] & FLAG_RD);
    response[3] = FLAG_RA | RCODE_SERVFAIL;
    Ok(response)
}
