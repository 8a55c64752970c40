use thiserror::Error;

use crate::{
    BROADCAST_DESTINATION, COMMAND_HEADER_SIZE, Category, CommandId, DataType, OperationType,
    PACKET_HEADER_SIZE, PACKET_SIZE_MAX, PACKET_SIZE_MIN, align4,
};

/// One camera control command.
///
/// Frame layout:
/// - destination (255 = broadcast)
/// - command length: command header + payload, excluding this header and padding
/// - command id
/// - reserved (0)
/// - category
/// - parameter
/// - data type
/// - operation type
/// - payload, little-endian elements
/// - zero padding up to a 4-byte boundary
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Command {
    pub destination: u8,
    pub command_id: CommandId,
    pub category: Category,
    pub parameter: u8,
    pub data_type: DataType,
    pub operation: OperationType,
    pub payload: Vec<u8>,
}

impl Command {
    /// A broadcast change-configuration command.
    pub fn new(
        category: Category,
        parameter: u8,
        data_type: DataType,
        operation: OperationType,
        payload: Vec<u8>,
    ) -> Self {
        Self {
            destination: BROADCAST_DESTINATION,
            command_id: CommandId::ChangeConfiguration,
            category,
            parameter,
            data_type,
            operation,
            payload,
        }
    }

    /// Size of the encoded frame, padding included.
    pub fn frame_len(&self) -> usize {
        PACKET_HEADER_SIZE + COMMAND_HEADER_SIZE + align4(self.payload.len())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Frame of {len} bytes is shorter than the 8 byte header")]
    TooShort { len: usize },
    #[error("Frame of {len} bytes exceeds the 64 byte maximum")]
    TooLong { len: usize },
    #[error("Command length {command_length} does not fit a {len} byte frame")]
    LengthMismatch { command_length: u8, len: usize },
    #[error("Unknown command id: 0x{id:x}")]
    UnknownCommandId { id: u8 },
    #[error("Unknown category: {category}")]
    UnknownCategory { category: u8 },
    #[error("Unknown data type: 0x{data_type:x}")]
    UnknownDataType { data_type: u8 },
    #[error("Unknown operation type: {operation}")]
    UnknownOperationType { operation: u8 },
    #[error("Payload of {len} bytes is not a whole number of {data_type:?} elements")]
    PartialElement { data_type: DataType, len: usize },
}

/// Serializes a command into a padded frame.
pub fn encode(command: &Command) -> Vec<u8> {
    let mut out = Vec::with_capacity(command.frame_len());
    out.push(command.destination);
    out.push((COMMAND_HEADER_SIZE + command.payload.len()) as u8);
    out.push(command.command_id as u8);
    out.push(0);
    out.push(command.category as u8);
    out.push(command.parameter);
    out.push(command.data_type as u8);
    out.push(command.operation as u8);
    out.extend_from_slice(&command.payload);
    out.resize(command.frame_len(), 0);
    out
}

/// Parses a frame back into a command. Padding is not inspected here; see
/// [`crate::validate::validate`] for the integrity checks.
pub fn decode(bytes: &[u8]) -> std::result::Result<Command, DecodeError> {
    let len = bytes.len();
    if len < PACKET_SIZE_MIN {
        return Err(DecodeError::TooShort { len });
    }
    if len > PACKET_SIZE_MAX {
        return Err(DecodeError::TooLong { len });
    }

    let command_length = bytes[1];
    let payload_len = (command_length as usize)
        .checked_sub(COMMAND_HEADER_SIZE)
        .ok_or(DecodeError::LengthMismatch {
            command_length,
            len,
        })?;
    let payload_start = PACKET_HEADER_SIZE + COMMAND_HEADER_SIZE;
    let payload = bytes
        .get(payload_start..payload_start + payload_len)
        .ok_or(DecodeError::LengthMismatch {
            command_length,
            len,
        })?;

    let command_id =
        CommandId::from_byte(bytes[2]).ok_or(DecodeError::UnknownCommandId { id: bytes[2] })?;
    let category =
        Category::from_byte(bytes[4]).ok_or(DecodeError::UnknownCategory { category: bytes[4] })?;
    let data_type = DataType::from_byte(bytes[6]).ok_or(DecodeError::UnknownDataType {
        data_type: bytes[6],
    })?;
    let operation = OperationType::from_byte(bytes[7]).ok_or(
        DecodeError::UnknownOperationType {
            operation: bytes[7],
        },
    )?;
    if payload.len() % data_type.element_size() != 0 {
        return Err(DecodeError::PartialElement {
            data_type,
            len: payload.len(),
        });
    }

    Ok(Command {
        destination: bytes[0],
        command_id,
        category,
        parameter: bytes[5],
        data_type,
        operation,
        payload: payload.to_vec(),
    })
}
