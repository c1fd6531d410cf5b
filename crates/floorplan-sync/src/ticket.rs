//! Shareable server tickets
//!
//! A ticket is `floorplan1` followed by the base32 encoding of the server's
//! postcard-serialized [`EndpointAddr`], so it carries relay and direct
//! addresses along with the endpoint id.

use anyhow::{anyhow, Result};
use iroh_base::EndpointAddr;

const TICKET_PREFIX: &str = "floorplan1";

/// Encode an EndpointAddr as a shareable ticket string
pub fn encode_ticket(addr: &EndpointAddr) -> Result<String> {
    let bytes = postcard::to_stdvec(addr)?;
    Ok(format!(
        "{}{}",
        TICKET_PREFIX,
        data_encoding::BASE32_NOPAD.encode(&bytes)
    ))
}

/// Decode a ticket string back to EndpointAddr
pub fn decode_ticket(ticket: &str) -> Result<EndpointAddr> {
    let ticket = ticket.trim();
    if let Some(data) = ticket.strip_prefix(TICKET_PREFIX) {
        let bytes = data_encoding::BASE32_NOPAD
            .decode(data.as_bytes())
            .map_err(|e| anyhow!("Invalid ticket encoding: {}", e))?;
        let addr: EndpointAddr =
            postcard::from_bytes(&bytes).map_err(|e| anyhow!("Invalid ticket data: {}", e))?;
        Ok(addr)
    } else {
        // A bare endpoint id works too, relying on discovery for addresses
        let id: iroh_base::PublicKey = ticket
            .parse()
            .map_err(|e| anyhow!("Invalid endpoint ID: {}", e))?;
        Ok(EndpointAddr::new(id))
    }
}
