//! Binary layouts of the session broadcasts.
//!
//! Every payload starts with the sender's participant ID (`i64`), followed by
//! kind specific fields. All integers and floats are little-endian.

use serde::{
    Deserialize,
    Serialize
};

use crate::math::{
    Quaternion,
    Vector3F
};

use super::ParticipantId;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageKind {
    HeadTransform,
    PresenterId,
    MenuAction,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("Unknown message kind id={0}")]
    UnknownKind(u8),

    #[error("Payload truncated, needed {needed} more bytes but only {remaining} remain")]
    Truncated {
        needed: usize,
        remaining: usize,
    },

    #[error("Negative name length {0}")]
    NegativeLength(i32),

    #[error("Name length {claimed} does not match remaining payload of {remaining} bytes")]
    LengthMismatch {
        claimed: usize,
        remaining: usize,
    },
}

impl MessageKind {
    pub fn id(self) -> u8 {
        match self {
            MessageKind::HeadTransform => 1,
            MessageKind::PresenterId => 2,
            MessageKind::MenuAction => 3,
        }
    }
}

impl TryFrom<u8> for MessageKind {
    type Error = DecodeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(MessageKind::HeadTransform),
            2 => Ok(MessageKind::PresenterId),
            3 => Ok(MessageKind::MenuAction),
            other => Err(DecodeError::UnknownKind(other)),
        }
    }
}

/// Cursor over an incoming payload.
pub struct MessageReader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> MessageReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let remaining = self.remaining();
        if remaining < N {
            return Err(DecodeError::Truncated { needed: N, remaining });
        }
        let mut bytes = [0u8; N];
        bytes.copy_from_slice(&self.data[self.offset..self.offset + N]);
        self.offset += N;
        Ok(bytes)
    }

    pub fn read_u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.take::<1>()?[0])
    }

    pub fn read_i32(&mut self) -> Result<i32, DecodeError> {
        Ok(i32::from_le_bytes(self.take()?))
    }

    pub fn read_i64(&mut self) -> Result<i64, DecodeError> {
        Ok(i64::from_le_bytes(self.take()?))
    }

    pub fn read_f32(&mut self) -> Result<f32, DecodeError> {
        Ok(f32::from_le_bytes(self.take()?))
    }

    pub fn read_vector3(&mut self) -> Result<Vector3F, DecodeError> {
        Ok(Vector3F::new(self.read_f32()?, self.read_f32()?, self.read_f32()?))
    }

    pub fn read_quaternion(&mut self) -> Result<Quaternion, DecodeError> {
        Ok(Quaternion::new(self.read_f32()?, self.read_f32()?, self.read_f32()?, self.read_f32()?))
    }
}

/// Builder for an outgoing payload.
#[derive(Debug, Default)]
pub struct MessageWriter {
    data: Vec<u8>,
}

impl MessageWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_u8(&mut self, value: u8) -> &mut Self {
        self.data.push(value);
        self
    }

    pub fn write_i32(&mut self, value: i32) -> &mut Self {
        self.data.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn write_i64(&mut self, value: i64) -> &mut Self {
        self.data.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn write_f32(&mut self, value: f32) -> &mut Self {
        self.data.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn write_vector3(&mut self, value: Vector3F) -> &mut Self {
        self.write_f32(value.x).write_f32(value.y).write_f32(value.z)
    }

    pub fn write_quaternion(&mut self, value: Quaternion) -> &mut Self {
        self.write_f32(value.x).write_f32(value.y).write_f32(value.z).write_f32(value.w)
    }

    pub fn finish(self) -> Vec<u8> {
        self.data
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeadTransformMessage {
    pub sender_id: ParticipantId,
    pub position: Vector3F,
    pub rotation: Quaternion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresenterIdMessage {
    pub sender_id: ParticipantId,
    pub presenter_id: ParticipantId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuActionMessage {
    pub sender_id: ParticipantId,
    pub action_name: String,
}

impl HeadTransformMessage {
    pub const KIND: MessageKind = MessageKind::HeadTransform;

    pub fn encode(&self) -> Vec<u8> {
        let mut writer = MessageWriter::new();
        writer
            .write_i64(self.sender_id)
            .write_vector3(self.position)
            .write_quaternion(self.rotation);
        writer.finish()
    }

    pub fn decode(payload: &[u8]) -> Result<Self, DecodeError> {
        let mut reader = MessageReader::new(payload);
        Ok(Self {
            sender_id: reader.read_i64()?,
            position: reader.read_vector3()?,
            rotation: reader.read_quaternion()?,
        })
    }
}

impl PresenterIdMessage {
    pub const KIND: MessageKind = MessageKind::PresenterId;

    pub fn encode(&self) -> Vec<u8> {
        let mut writer = MessageWriter::new();
        writer.write_i64(self.sender_id).write_i64(self.presenter_id);
        writer.finish()
    }

    pub fn decode(payload: &[u8]) -> Result<Self, DecodeError> {
        let mut reader = MessageReader::new(payload);
        Ok(Self {
            sender_id: reader.read_i64()?,
            presenter_id: reader.read_i64()?,
        })
    }
}

impl MenuActionMessage {
    pub const KIND: MessageKind = MessageKind::MenuAction;

    pub fn encode(&self) -> Vec<u8> {
        let mut writer = MessageWriter::new();
        // One byte per character, non-latin-1 characters cannot be represented
        let bytes: Vec<u8> = self.action_name.chars().map(|c| u8::try_from(c).unwrap_or(b'?')).collect();
        writer.write_i64(self.sender_id).write_i32(bytes.len() as i32);
        for byte in bytes {
            writer.write_u8(byte);
        }
        writer.finish()
    }

    /// The claimed name length must cover exactly the rest of the payload.
    pub fn decode(payload: &[u8]) -> Result<Self, DecodeError> {
        let mut reader = MessageReader::new(payload);
        let sender_id = reader.read_i64()?;
        let claimed = reader.read_i32()?;
        let claimed = usize::try_from(claimed).map_err(|_| DecodeError::NegativeLength(claimed))?;

        let remaining = reader.remaining();
        if claimed != remaining {
            return Err(DecodeError::LengthMismatch { claimed, remaining });
        }

        let mut action_name = String::with_capacity(claimed);
        for _ in 0..claimed {
            action_name.push(char::from(reader.read_u8()?));
        }

        Ok(Self {
            sender_id,
            action_name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_menu_action(sender: i64, claimed_len: i32, name: &[u8]) -> Vec<u8> {
        let mut writer = MessageWriter::new();
        writer.write_i64(sender).write_i32(claimed_len);
        for b in name {
            writer.write_u8(*b);
        }
        writer.finish()
    }

    #[test]
    fn test_menu_action_decodes_exact_length() {
        let payload = raw_menu_action(7, 4, b"Back");
        let msg = MenuActionMessage::decode(&payload).unwrap();
        assert_eq!(msg.sender_id, 7);
        assert_eq!(msg.action_name, "Back");
    }

    #[test]
    fn test_menu_action_rejects_overclaimed_length() {
        let payload = raw_menu_action(7, 5, b"Back");
        assert_eq!(
            MenuActionMessage::decode(&payload),
            Err(DecodeError::LengthMismatch { claimed: 5, remaining: 4 })
        );
    }

    #[test]
    fn test_menu_action_rejects_trailing_bytes() {
        let payload = raw_menu_action(7, 2, b"Back");
        assert!(matches!(
            MenuActionMessage::decode(&payload),
            Err(DecodeError::LengthMismatch { claimed: 2, remaining: 4 })
        ));
    }

    #[test]
    fn test_menu_action_rejects_negative_length() {
        let payload = raw_menu_action(7, -1, b"");
        assert_eq!(MenuActionMessage::decode(&payload), Err(DecodeError::NegativeLength(-1)));
    }

    #[test]
    fn test_menu_action_truncated_header() {
        let payload = 7i64.to_le_bytes().to_vec();
        assert!(matches!(
            MenuActionMessage::decode(&payload),
            Err(DecodeError::Truncated { needed: 4, remaining: 0 })
        ));
    }

    #[test]
    fn test_head_transform_layout() {
        let msg = HeadTransformMessage {
            sender_id: 3,
            position: Vector3F::new(1.0, 0.0, 0.0),
            rotation: Quaternion::IDENTITY,
        };
        let payload = msg.encode();
        assert_eq!(payload.len(), 8 + 3 * 4 + 4 * 4);
        assert_eq!(&payload[..8], &3i64.to_le_bytes());
        assert_eq!(HeadTransformMessage::decode(&payload).unwrap(), msg);
    }

    #[test]
    fn test_head_transform_truncated() {
        let msg = HeadTransformMessage {
            sender_id: 3,
            position: Vector3F::new(1.0, 2.0, 3.0),
            rotation: Quaternion::IDENTITY,
        };
        let payload = msg.encode();
        assert!(HeadTransformMessage::decode(&payload[..payload.len() - 1]).is_err());
    }

    #[test]
    fn test_kind_ids() {
        for kind in [MessageKind::HeadTransform, MessageKind::PresenterId, MessageKind::MenuAction] {
            assert_eq!(MessageKind::try_from(kind.id()), Ok(kind));
        }
        assert_eq!(MessageKind::try_from(0), Err(DecodeError::UnknownKind(0)));
    }
}
