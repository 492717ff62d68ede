//! SOME/IP Service Discovery messages.
//!
//! The entries and options arrays are length-prefixed and decoded from
//! extracted slices, so every offset below `entries` and `options` is
//! relative to the slice rather than to the message.

use std::net::{Ipv4Addr, Ipv6Addr};

use crate::decode::stream::{ByteStream, StructBuilder};
use crate::decode::value::{DecodedElement, DecodedValue};
use crate::decode::{DecodeError, FormatDecoder, Result};

pub const SOME_IP_SD_FORMAT_ID: &str = "some_ip_sd";

#[derive(Debug, Default)]
pub struct SomeIpSdFormat;

impl FormatDecoder for SomeIpSdFormat {
    fn id(&self) -> &str {
        SOME_IP_SD_FORMAT_ID
    }

    fn description(&self) -> &str {
        "SOME/IP Service Discovery"
    }

    fn parse(&self, data: &[u8]) -> Result<DecodedValue> {
        read_message(&mut ByteStream::new(data))
    }
}

pub fn entry_type_name(raw: u8) -> &'static str {
    match raw {
        0x00 => "find_service",
        0x01 => "offer_service",
        0x06 => "subscribe_eventgroup",
        0x07 => "subscribe_eventgroup_ack",
        _ => "unknown",
    }
}

pub fn option_type_name(raw: u8) -> &'static str {
    match raw {
        0x01 => "configuration",
        0x02 => "load_balancing",
        0x04 => "ipv4_endpoint",
        0x06 => "ipv6_endpoint",
        0x14 => "ipv4_multicast",
        0x16 => "ipv6_multicast",
        0x24 => "ipv4_sd_endpoint",
        0x26 => "ipv6_sd_endpoint",
        _ => "unknown",
    }
}

fn l4_protocol_name(raw: u8) -> &'static str {
    match raw {
        0x06 => "tcp",
        0x11 => "udp",
        _ => "unknown",
    }
}

fn enum_value(name: &str, raw: u8) -> DecodedValue {
    DecodedValue::Enum {
        name: name.to_string(),
        raw: raw.into(),
    }
}

fn read_message(io: &mut ByteStream<'_>) -> Result<DecodedValue> {
    let mut msg = StructBuilder::new("SomeIpSd");
    msg.nested("flags", io, read_flags)?;
    msg.field("reserved", io, |io| io.read_bytes(3))?;
    let len_entries = msg.field("len_entries", io, |io| io.read_u32_be())?;
    msg.nested("entries", io, |io| {
        read_entries(&mut io.substream(len_entries.into())?)
    })?;
    let len_options = msg.field("len_options", io, |io| io.read_u32_be())?;
    msg.nested("options", io, |io| {
        read_options(&mut io.substream(len_options.into())?)
    })?;
    Ok(msg.finish())
}

fn read_flags(io: &mut ByteStream<'_>) -> Result<DecodedValue> {
    let mut flags = StructBuilder::new("SdFlags");
    flags.field("reboot", io, |io| Ok(io.read_bits_be(1)? != 0))?;
    flags.field("unicast", io, |io| Ok(io.read_bits_be(1)? != 0))?;
    flags.field("initial_data", io, |io| Ok(io.read_bits_be(1)? != 0))?;
    flags.field("reserved", io, |io| io.read_bits_be(5))?;
    Ok(flags.finish())
}

/// Decode items until the stream is exhausted.
fn read_until_eof<F>(io: &mut ByteStream<'_>, mut read: F) -> Result<DecodedValue>
where
    F: FnMut(&mut ByteStream<'_>) -> Result<DecodedValue>,
{
    let mut items = Vec::new();
    while !io.is_eof() {
        let start = io.pos();
        let value = read(io)?;
        items.push(DecodedElement {
            value,
            start: Some(start),
            end: Some(io.pos()),
        });
    }
    Ok(DecodedValue::Array(items))
}

fn read_entries(io: &mut ByteStream<'_>) -> Result<DecodedValue> {
    let mut entries = StructBuilder::new("SomeIpSdEntries");
    entries.nested("entries", io, |io| read_until_eof(io, read_entry))?;
    Ok(entries.finish())
}

fn read_entry(io: &mut ByteStream<'_>) -> Result<DecodedValue> {
    let mut entry = StructBuilder::new("SdEntry");
    let mut entry_type = 0u8;
    entry.nested("header", io, |io| {
        let (header, raw_type) = read_entry_header(io)?;
        entry_type = raw_type;
        Ok(header)
    })?;
    match entry_type {
        0x00 | 0x01 => entry.nested("content", io, read_service_entry)?,
        0x06 | 0x07 => entry.nested("content", io, read_eventgroup_entry)?,
        _ => {
            entry.field("content", io, |io| io.read_bytes(4))?;
        }
    }
    Ok(entry.finish())
}

fn read_entry_header(io: &mut ByteStream<'_>) -> Result<(DecodedValue, u8)> {
    let mut header = StructBuilder::new("SdEntryHeader");
    let mut raw_type = 0u8;
    header.nested("type", io, |io| {
        raw_type = io.read_u8()?;
        Ok(enum_value(entry_type_name(raw_type), raw_type))
    })?;
    header.field("index_first_options", io, |io| io.read_u8())?;
    header.field("index_second_options", io, |io| io.read_u8())?;
    header.field("number_first_options", io, |io| io.read_bits_be(4))?;
    header.field("number_second_options", io, |io| io.read_bits_be(4))?;
    header.field("service_id", io, |io| io.read_u16_be())?;
    header.field("instance_id", io, |io| io.read_u16_be())?;
    header.field("major_version", io, |io| io.read_u8())?;
    header.field("ttl", io, |io| io.read_bits_be(24))?;
    Ok((header.finish(), raw_type))
}

fn read_service_entry(io: &mut ByteStream<'_>) -> Result<DecodedValue> {
    let mut service = StructBuilder::new("SdServiceEntry");
    service.field("minor_version", io, |io| io.read_u32_be())?;
    Ok(service.finish())
}

fn read_eventgroup_entry(io: &mut ByteStream<'_>) -> Result<DecodedValue> {
    let mut group = StructBuilder::new("SdEventgroupEntry");
    group.field("reserved", io, |io| io.read_u8())?;
    group.field("initial_data_requested", io, |io| {
        Ok(io.read_bits_be(1)? != 0)
    })?;
    group.field("reserved2", io, |io| io.read_bits_be(3))?;
    group.field("counter", io, |io| io.read_bits_be(4))?;
    group.field("event_group_id", io, |io| io.read_u16_be())?;
    Ok(group.finish())
}

fn read_options(io: &mut ByteStream<'_>) -> Result<DecodedValue> {
    let mut options = StructBuilder::new("SomeIpSdOptions");
    options.nested("options", io, |io| read_until_eof(io, read_option))?;
    Ok(options.finish())
}

fn read_option(io: &mut ByteStream<'_>) -> Result<DecodedValue> {
    let mut option = StructBuilder::new("SdOption");
    let mut length = 0u16;
    let mut option_type = 0u8;
    option.nested("header", io, |io| {
        let mut header = StructBuilder::new("SdOptionHeader");
        length = header.field("length", io, |io| io.read_u16_be())?;
        header.nested("type", io, |io| {
            option_type = io.read_u8()?;
            Ok(enum_value(option_type_name(option_type), option_type))
        })?;
        Ok(header.finish())
    })?;

    let content_start = io.pos();
    match option_type {
        0x01 => option.nested("content", io, |io| read_configuration_option(io, length))?,
        0x02 => option.nested("content", io, read_load_balancing_option)?,
        0x04 | 0x14 | 0x24 => option.nested("content", io, |io| {
            read_endpoint_option(io, "SdIpv4EndpointOption", 4)
        })?,
        0x06 | 0x16 | 0x26 => option.nested("content", io, |io| {
            read_endpoint_option(io, "SdIpv6EndpointOption", 16)
        })?,
        _ => {
            option.field("content", io, |io| io.read_bytes(length.into()))?;
        }
    }

    let consumed = io.pos() - content_start;
    if consumed != u64::from(length) {
        return Err(DecodeError::InvalidValue {
            field: "option.length".to_string(),
            message: format!(
                "declared {} bytes but {} option uses {}",
                length,
                option_type_name(option_type),
                consumed
            ),
        });
    }
    Ok(option.finish())
}

fn read_configuration_option(io: &mut ByteStream<'_>, length: u16) -> Result<DecodedValue> {
    let mut config = StructBuilder::new("SdConfigurationOption");
    config.field("reserved", io, |io| io.read_u8())?;
    let body_len = u64::from(length.saturating_sub(1));
    config.nested("configurations", io, |io| {
        read_until_eof(&mut io.substream(body_len)?, read_configuration_string)
    })?;
    Ok(config.finish())
}

fn read_configuration_string(io: &mut ByteStream<'_>) -> Result<DecodedValue> {
    let len = io.read_u8()?;
    if len == 0 {
        // terminator; swallow any trailing padding
        io.read_bytes_full();
        return Ok(DecodedValue::Text(String::new()));
    }
    let text = io.read_bytes(len.into())?;
    Ok(DecodedValue::Text(String::from_utf8_lossy(text).into_owned()))
}

fn read_load_balancing_option(io: &mut ByteStream<'_>) -> Result<DecodedValue> {
    let mut lb = StructBuilder::new("SdLoadBalancingOption");
    lb.field("reserved", io, |io| io.read_u8())?;
    lb.field("priority", io, |io| io.read_u16_be())?;
    lb.field("weight", io, |io| io.read_u16_be())?;
    Ok(lb.finish())
}

fn read_endpoint_option(
    io: &mut ByteStream<'_>,
    type_name: &str,
    address_len: u64,
) -> Result<DecodedValue> {
    let mut endpoint = StructBuilder::new(type_name);
    endpoint.field("reserved", io, |io| io.read_u8())?;
    let address = endpoint.field("address", io, |io| io.read_bytes(address_len))?;
    endpoint.pseudo("address_text", DecodedValue::Text(format_address(address)));
    endpoint.field("reserved2", io, |io| io.read_u8())?;
    endpoint.nested("l4_protocol", io, |io| {
        let raw = io.read_u8()?;
        Ok(enum_value(l4_protocol_name(raw), raw))
    })?;
    endpoint.field("port", io, |io| io.read_u16_be())?;
    Ok(endpoint.finish())
}

fn format_address(bytes: &[u8]) -> String {
    if let Ok(v4) = <[u8; 4]>::try_from(bytes) {
        Ipv4Addr::from(v4).to_string()
    } else if let Ok(v6) = <[u8; 16]>::try_from(bytes) {
        Ipv6Addr::from(v6).to_string()
    } else {
        hex::encode(bytes)
    }
}
