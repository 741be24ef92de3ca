//! Bytecode encoding for the EV3 PWM device
//!
//! Every instruction is a leading opcode byte followed by zero to two
//! operand bytes:
//! ```text
//! [ 0x03 ]                       program start
//! [ 0x02 ]                       program stop
//! [ 0xA4 ][ mask ][ power ]      set output power (0-100)
//! [ 0xA6 ][ mask ]               output on
//! [ 0xA3 ][ mask ][ 0x00|0x01 ]  output off (float or brake)
//! [ 0xA7 ][ mask ][ 0x01|0xFF ]  set polarity (forward or reverse)
//! ```
//! Raw bytes given as `0xHH` on the command line are passed through as-is.

use bytes::{BufMut, Bytes, BytesMut};
use std::fmt;

/// Protocol opcodes understood by the device
pub mod opcode {
    pub const PROGRAM_STOP: u8 = 0x02;
    pub const PROGRAM_START: u8 = 0x03;
    pub const OUTPUT_STOP: u8 = 0xA3;
    pub const OUTPUT_POWER: u8 = 0xA4;
    pub const OUTPUT_START: u8 = 0xA6;
    pub const OUTPUT_POLARITY: u8 = 0xA7;
}

/// Longest encoded instruction in bytes
pub const MAX_INSTRUCTION_LEN: usize = 3;

/// One of the four motor outputs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Motor {
    A,
    B,
    C,
    D,
}

impl Motor {
    /// All motors in port order
    pub const ALL: [Motor; 4] = [Motor::A, Motor::B, Motor::C, Motor::D];

    /// Look up a motor by its port letter (upper case only)
    pub fn from_letter(letter: char) -> Option<Self> {
        Motor::ALL.into_iter().find(|motor| motor.letter() == letter)
    }

    /// Port letter for this motor
    pub fn letter(self) -> char {
        match self {
            Motor::A => 'A',
            Motor::B => 'B',
            Motor::C => 'C',
            Motor::D => 'D',
        }
    }

    /// Single-bit selector byte (A = bit 0 .. D = bit 3)
    pub fn mask(self) -> u8 {
        match self {
            Motor::A => 0x01,
            Motor::B => 0x02,
            Motor::C => 0x04,
            Motor::D => 0x08,
        }
    }
}

impl fmt::Display for Motor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// Motor polarity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Reverse,
}

impl Direction {
    pub fn as_byte(self) -> u8 {
        match self {
            Direction::Forward => 0x01,
            Direction::Reverse => 0xFF,
        }
    }
}

/// How an output behaves once switched off
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopMode {
    /// Let the motor coast
    Float,
    /// Short the windings and hold
    Brake,
}

impl StopMode {
    pub fn as_byte(self) -> u8 {
        match self {
            StopMode::Float => 0x00,
            StopMode::Brake => 0x01,
        }
    }
}

/// A single device instruction, ready to be encoded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    /// Pass-through byte
    Raw(u8),
    /// Program start
    Start,
    /// Program stop
    Stop,
    /// Set output power percentage (0-100)
    SetPower { motor: Motor, power: u8 },
    /// Switch an output on
    OutputOn(Motor),
    /// Switch an output off
    OutputOff { motor: Motor, mode: StopMode },
    /// Set output polarity
    SetDirection { motor: Motor, direction: Direction },
}

impl Instruction {
    /// Number of bytes this instruction encodes to
    pub fn encoded_len(&self) -> usize {
        match self {
            Instruction::Raw(_) | Instruction::Start | Instruction::Stop => 1,
            Instruction::OutputOn(_) => 2,
            Instruction::SetPower { .. }
            | Instruction::OutputOff { .. }
            | Instruction::SetDirection { .. } => 3,
        }
    }

    /// Encode directly into a provided buffer
    pub fn encode_into(&self, buf: &mut BytesMut) {
        buf.reserve(self.encoded_len());

        match *self {
            Instruction::Raw(value) => buf.put_u8(value),
            Instruction::Start => buf.put_u8(opcode::PROGRAM_START),
            Instruction::Stop => buf.put_u8(opcode::PROGRAM_STOP),
            Instruction::SetPower { motor, power } => {
                buf.put_slice(&[opcode::OUTPUT_POWER, motor.mask(), power]);
            }
            Instruction::OutputOn(motor) => {
                buf.put_slice(&[opcode::OUTPUT_START, motor.mask()]);
            }
            Instruction::OutputOff { motor, mode } => {
                buf.put_slice(&[opcode::OUTPUT_STOP, motor.mask(), mode.as_byte()]);
            }
            Instruction::SetDirection { motor, direction } => {
                buf.put_slice(&[opcode::OUTPUT_POLARITY, motor.mask(), direction.as_byte()]);
            }
        }
    }

    /// Encode into a fresh byte buffer
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.encoded_len());
        self.encode_into(&mut buf);
        buf.freeze()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_motor_masks() {
        for (index, motor) in Motor::ALL.iter().enumerate() {
            assert_eq!(motor.mask(), 1u8 << index);
            assert_eq!(Motor::from_letter(motor.letter()), Some(*motor));
        }
    }

    #[test]
    fn test_motor_rejects_other_letters() {
        for letter in ['E', 'Z', 'a', 'd', '@', '1'] {
            assert_eq!(Motor::from_letter(letter), None, "letter {letter}");
        }
    }

    #[test]
    fn test_single_byte_instructions() {
        assert_eq!(&Instruction::Start.encode()[..], &[0x03]);
        assert_eq!(&Instruction::Stop.encode()[..], &[0x02]);
        assert_eq!(&Instruction::Raw(0xFE).encode()[..], &[0xFE]);
    }

    #[test]
    fn test_motor_instructions() {
        let power = Instruction::SetPower { motor: Motor::C, power: 100 };
        assert_eq!(&power.encode()[..], &[0xA4, 0x04, 100]);

        assert_eq!(&Instruction::OutputOn(Motor::D).encode()[..], &[0xA6, 0x08]);

        let float = Instruction::OutputOff { motor: Motor::A, mode: StopMode::Float };
        assert_eq!(&float.encode()[..], &[0xA3, 0x01, 0x00]);

        let brake = Instruction::OutputOff { motor: Motor::B, mode: StopMode::Brake };
        assert_eq!(&brake.encode()[..], &[0xA3, 0x02, 0x01]);

        let reverse = Instruction::SetDirection { motor: Motor::A, direction: Direction::Reverse };
        assert_eq!(&reverse.encode()[..], &[0xA7, 0x01, 0xFF]);
    }

    #[test]
    fn test_encoded_len_matches_output() {
        let instructions = [
            Instruction::Raw(0),
            Instruction::Start,
            Instruction::OutputOn(Motor::B),
            Instruction::SetPower { motor: Motor::A, power: 0 },
            Instruction::SetDirection { motor: Motor::D, direction: Direction::Forward },
        ];

        for instruction in instructions {
            assert_eq!(instruction.encode().len(), instruction.encoded_len());
            assert!(instruction.encoded_len() <= MAX_INSTRUCTION_LEN);
        }
    }
}
