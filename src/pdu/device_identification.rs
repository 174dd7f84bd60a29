//! FC 0x2B / MEI type 0x0E: read device identification.

use crate::binary;
use crate::errors::{FrameError, FrameStructureKind, PduError, PduResult};

use super::parse_response_header;

pub const ENCAPSULATED_INTERFACE_TRANSPORT: u8 = 0x2B;
pub const MEI_TYPE_READ_DEVICE_ID: u8 = 0x0E;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadDeviceIdCode {
    Basic,
    Regular,
    Extended,
    Specific,
}

impl ReadDeviceIdCode {
    fn from_u8(v: u8) -> PduResult<Self> {
        match v {
            0x01 => Ok(Self::Basic),
            0x02 => Ok(Self::Regular),
            0x03 => Ok(Self::Extended),
            0x04 => Ok(Self::Specific),
            other => Err(pdu_too_short_detail(format!(
                "invalid read device id code 0x{other:02X}"
            ))),
        }
    }

    fn to_u8(self) -> u8 {
        match self {
            Self::Basic => 0x01,
            Self::Regular => 0x02,
            Self::Extended => 0x03,
            Self::Specific => 0x04,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceIdRequest {
    pub read_code: ReadDeviceIdCode,
    pub object_id: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceIdResponse {
    pub read_code: ReadDeviceIdCode,
    pub conformity: u8,
    pub more_follows: bool,
    pub next_object_id: u8,
    pub objects: Vec<(u8, String)>,
}

fn pdu_too_short() -> PduError {
    PduError::Frame(FrameError::pdu_too_short(
        "device identification PDU truncated",
    ))
}

fn pdu_too_short_detail(detail: String) -> PduError {
    PduError::Frame(FrameError::pdu_too_short(detail))
}

pub fn build_request(req: DeviceIdRequest) -> Vec<u8> {
    vec![
        ENCAPSULATED_INTERFACE_TRANSPORT,
        MEI_TYPE_READ_DEVICE_ID,
        req.read_code.to_u8(),
        req.object_id,
    ]
}

pub fn parse_request(pdu: &[u8]) -> PduResult<DeviceIdRequest> {
    super::expect_function_code(pdu, ENCAPSULATED_INTERFACE_TRANSPORT)?;
    let mei = binary::u8(pdu, 1).ok_or_else(pdu_too_short)?;
    if mei != MEI_TYPE_READ_DEVICE_ID {
        return Err(PduError::Frame(FrameError::structure(
            FrameStructureKind::InvalidMeiType,
            format!("expected 0x0E, got 0x{mei:02X}"),
        )));
    }
    let read_code = ReadDeviceIdCode::from_u8(binary::u8(pdu, 2).ok_or_else(pdu_too_short)?)?;
    let object_id = binary::u8(pdu, 3).ok_or_else(pdu_too_short)?;
    Ok(DeviceIdRequest {
        read_code,
        object_id,
    })
}

pub fn parse_response(pdu: &[u8]) -> PduResult<DeviceIdResponse> {
    parse_response_header(pdu, ENCAPSULATED_INTERFACE_TRANSPORT)?;
    let mei = binary::u8(pdu, 1).ok_or_else(pdu_too_short)?;
    if mei != MEI_TYPE_READ_DEVICE_ID {
        return Err(PduError::Frame(FrameError::structure(
            FrameStructureKind::InvalidMeiType,
            format!("expected 0x0E, got 0x{mei:02X}"),
        )));
    }
    let read_code = ReadDeviceIdCode::from_u8(binary::u8(pdu, 2).ok_or_else(pdu_too_short)?)?;
    let conformity = binary::u8(pdu, 3).ok_or_else(pdu_too_short)?;
    let more_follows = binary::u8(pdu, 4).ok_or_else(pdu_too_short)? != 0x00;
    let next_object_id = binary::u8(pdu, 5).ok_or_else(pdu_too_short)?;
    let num_objects = binary::u8(pdu, 6).ok_or_else(pdu_too_short)? as usize;

    let mut objects = Vec::with_capacity(num_objects);
    let mut offset = 7;
    for _ in 0..num_objects {
        let object_id = binary::u8(pdu, offset).ok_or_else(pdu_too_short)?;
        let len = binary::u8(pdu, offset + 1).ok_or_else(pdu_too_short)? as usize;
        let raw = binary::bytes(pdu, offset + 2, len).ok_or_else(pdu_too_short)?;
        // lossy: the parser never fails on an encoding, per spec §4.3.
        let value = String::from_utf8_lossy(raw).into_owned();
        objects.push((object_id, value));
        offset += 2 + len;
    }

    Ok(DeviceIdResponse {
        read_code,
        conformity,
        more_follows,
        next_object_id,
        objects,
    })
}

pub fn build_response(resp: &DeviceIdResponse) -> Vec<u8> {
    let mut pdu = Vec::new();
    pdu.push(MEI_TYPE_READ_DEVICE_ID);
    pdu.push(resp.read_code.to_u8());
    pdu.push(resp.conformity);
    pdu.push(resp.more_follows as u8);
    pdu.push(resp.next_object_id);
    pdu.push(resp.objects.len() as u8);
    for (id, value) in &resp.objects {
        pdu.push(*id);
        let bytes = value.as_bytes();
        pdu.push(bytes.len() as u8);
        pdu.extend_from_slice(bytes);
    }
    pdu
}
