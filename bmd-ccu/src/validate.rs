use thiserror::Error;

use crate::{
    COMMAND_HEADER_SIZE, Category, DataType, PACKET_HEADER_SIZE, PACKET_SIZE_MAX,
    PACKET_SIZE_MIN, align4,
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Frame of {len} bytes is shorter than the 8 byte header")]
    TooShort { len: usize },
    #[error("Frame of {len} bytes exceeds the 64 byte maximum")]
    TooLong { len: usize },
    #[error("Command length {command_length} does not fit a {len} byte frame")]
    LengthMismatch { command_length: u8, len: usize },
    #[error("Frame of {len} bytes is not padded to {expected} bytes")]
    Misaligned { len: usize, expected: usize },
    #[error("Padding byte at offset {offset} is not zero")]
    NonZeroPadding { offset: usize },
    #[error("Unknown category: {category}")]
    UnknownCategory { category: u8 },
    #[error("Parameter {parameter} is not valid for category {category}")]
    UnknownParameter { category: Category, parameter: u8 },
    #[error("Unknown data type: 0x{data_type:x}")]
    UnknownDataType { data_type: u8 },
    #[error("Payload of {len} bytes is not a whole number of {data_type:?} elements")]
    PartialElement { data_type: DataType, len: usize },
}

/// Structural check of a frame, used on outgoing and incoming bytes alike.
///
/// The protocol has no checksum: the command length byte and the zero
/// padding after the payload are what tie a frame together.
pub fn validate(bytes: &[u8]) -> std::result::Result<(), ValidationError> {
    let len = bytes.len();
    if len < PACKET_SIZE_MIN {
        return Err(ValidationError::TooShort { len });
    }
    if len > PACKET_SIZE_MAX {
        return Err(ValidationError::TooLong { len });
    }

    let command_length = bytes[1];
    let header = PACKET_HEADER_SIZE + COMMAND_HEADER_SIZE;
    let payload_len = match (command_length as usize).checked_sub(COMMAND_HEADER_SIZE) {
        Some(payload_len) if header + payload_len <= len => payload_len,
        _ => {
            return Err(ValidationError::LengthMismatch {
                command_length,
                len,
            });
        }
    };
    let expected = header + align4(payload_len);
    if len != expected {
        return Err(ValidationError::Misaligned { len, expected });
    }
    if let Some(offset) = (header + payload_len..len).find(|i| bytes[*i] != 0) {
        return Err(ValidationError::NonZeroPadding { offset });
    }

    let category = Category::from_byte(bytes[4])
        .ok_or(ValidationError::UnknownCategory { category: bytes[4] })?;
    let parameter = bytes[5];
    if !category.is_valid_parameter(parameter) {
        return Err(ValidationError::UnknownParameter {
            category,
            parameter,
        });
    }
    let data_type = DataType::from_byte(bytes[6]).ok_or(ValidationError::UnknownDataType {
        data_type: bytes[6],
    })?;
    if payload_len % data_type.element_size() != 0 {
        return Err(ValidationError::PartialElement {
            data_type,
            len: payload_len,
        });
    }
    Ok(())
}

pub fn is_valid(bytes: &[u8]) -> bool {
    validate(bytes).is_ok()
}
