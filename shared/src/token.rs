//! Command-line token classification
//!
//! Each argument after the options is one token. Tokens either encode to an
//! [`Instruction`] or control the flush/wait discipline.

use crate::codec::{Direction, Instruction, Motor, StopMode};
use crate::limits;
use std::num::IntErrorKind;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while classifying a token. Every variant keeps the
/// offending token text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("bad hex byte [{0}]")]
    BadHex(String),

    #[error("hex value [{0}] out of range (0-255)")]
    HexOutOfRange(String),

    #[error("bad motor in [{0}], must be A-D")]
    BadMotor(String),

    #[error("bad power setting [{0}]")]
    BadPower(String),

    #[error("bad power value {value} in [{token}], must be 0-{max}", max = limits::MAX_POWER)]
    PowerOutOfRange { token: String, value: i64 },

    #[error("bad wait time [{0}]")]
    BadWait(String),

    #[error("wait time of {value} milliseconds in [{token}] is out of range (1-{max})", max = limits::MAX_WAIT_MS)]
    WaitOutOfRange { token: String, value: i64 },

    #[error("unexpected trailing characters in [{0}]")]
    TrailingCharacters(String),

    #[error("unrecognised command [{0}]")]
    Unknown(String),
}

impl TokenError {
    /// The token that failed to classify
    pub fn token(&self) -> &str {
        match self {
            TokenError::BadHex(token)
            | TokenError::HexOutOfRange(token)
            | TokenError::BadMotor(token)
            | TokenError::BadPower(token)
            | TokenError::BadWait(token)
            | TokenError::TrailingCharacters(token)
            | TokenError::Unknown(token) => token,
            TokenError::PowerOutOfRange { token, .. } | TokenError::WaitOutOfRange { token, .. } => {
                token
            }
        }
    }
}

/// A classified command token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    /// Bytes to append to the buffer
    Instruction(Instruction),
    /// Flush, then sleep
    Wait(Duration),
    /// Flush
    Send,
}

/// How closely a token has to match the command grammar
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Syntax {
    /// Read a command from the front of the token and ignore the rest.
    /// Tokens that are not commands at all are skipped.
    #[default]
    Lenient,
    /// The whole token must be exactly one command
    Strict,
}

/// A token read under some [`Syntax`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classified<'a> {
    /// The whole token is one command
    Exact(Token),
    /// A command followed by text that was ignored
    Prefix { token: Token, ignored: &'a str },
    /// Not a command
    Unknown,
}

impl Token {
    /// Classify `text`, still rejecting malformed or out-of-range values
    pub fn classify(text: &str, syntax: Syntax) -> Result<Classified<'_>, TokenError> {
        match syntax {
            Syntax::Lenient => read(text),
            Syntax::Strict => text.parse().map(Classified::Exact),
        }
    }
}

fn exact_or_prefix(token: Token, rest: &str) -> Classified<'_> {
    if rest.is_empty() {
        Classified::Exact(token)
    } else {
        Classified::Prefix {
            token,
            ignored: rest,
        }
    }
}

/// Scan a leading signed decimal integer the way `%d` does, returning it
/// with whatever follows. Values past the `i64` range saturate.
fn scan_int(text: &str) -> Option<(i64, &str)> {
    let text = text.trim_start();
    let sign = usize::from(text.starts_with(['+', '-']));
    let digits = text[sign..].bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }

    let (number, rest) = text.split_at(sign + digits);
    let value = match number.parse::<i64>() {
        Ok(value) => value,
        Err(e) if matches!(e.kind(), IntErrorKind::NegOverflow) => i64::MIN,
        Err(_) => i64::MAX,
    };
    Some((value, rest))
}

fn read_hex<'a>(token: &'a str, digits: &'a str) -> Result<Classified<'a>, TokenError> {
    let len = digits.bytes().take_while(u8::is_ascii_hexdigit).count();
    if len == 0 {
        return Err(TokenError::BadHex(token.into()));
    }
    let (hex, rest) = digits.split_at(len);

    // All digits are valid, so any parse failure is overflow
    let value = u32::from_str_radix(hex, 16)
        .ok()
        .and_then(|v| u8::try_from(v).ok())
        .ok_or_else(|| TokenError::HexOutOfRange(token.into()))?;

    Ok(exact_or_prefix(Token::Instruction(Instruction::Raw(value)), rest))
}

/// Split `<op><motor><rest>` and resolve the motor letter
fn split_motor(token: &str) -> Result<(Motor, &str), TokenError> {
    let mut chars = token.chars();
    chars.next();

    let motor = chars
        .next()
        .and_then(Motor::from_letter)
        .ok_or_else(|| TokenError::BadMotor(token.into()))?;

    Ok((motor, chars.as_str()))
}

fn read_output(
    token: &str,
    instruction: fn(Motor) -> Instruction,
) -> Result<Classified<'_>, TokenError> {
    let (motor, rest) = split_motor(token)?;
    Ok(exact_or_prefix(Token::Instruction(instruction(motor)), rest))
}

fn read_power(token: &str) -> Result<Classified<'_>, TokenError> {
    let (motor, digits) = split_motor(token)?;
    let (value, rest) = scan_int(digits).ok_or_else(|| TokenError::BadPower(token.into()))?;

    let power = u8::try_from(value)
        .ok()
        .filter(|p| *p <= limits::MAX_POWER)
        .ok_or_else(|| TokenError::PowerOutOfRange {
            token: token.into(),
            value,
        })?;

    Ok(exact_or_prefix(
        Token::Instruction(Instruction::SetPower { motor, power }),
        rest,
    ))
}

/// The sign is everything after the motor letter
fn read_direction(token: &str) -> Result<Classified<'_>, TokenError> {
    let (motor, sign) = split_motor(token)?;

    let direction = if sign.starts_with('1') {
        Direction::Forward
    } else {
        Direction::Reverse
    };

    Ok(Classified::Exact(Token::Instruction(
        Instruction::SetDirection { motor, direction },
    )))
}

fn read_wait<'a>(token: &'a str, digits: &'a str) -> Result<Classified<'a>, TokenError> {
    let (value, rest) = scan_int(digits).ok_or_else(|| TokenError::BadWait(token.into()))?;

    if value <= 0 || value > limits::MAX_WAIT_MS as i64 {
        return Err(TokenError::WaitOutOfRange {
            token: token.into(),
            value,
        });
    }

    // Range-checked above
    Ok(exact_or_prefix(
        Token::Wait(Duration::from_millis(value as u64)),
        rest,
    ))
}

fn read(token: &str) -> Result<Classified<'_>, TokenError> {
    if let Some(digits) = token.strip_prefix("0x") {
        return read_hex(token, digits);
    }

    match token {
        "start" => return Ok(Classified::Exact(Token::Instruction(Instruction::Start))),
        "stop" => return Ok(Classified::Exact(Token::Instruction(Instruction::Stop))),
        _ => {}
    }

    let Some(op) = token.chars().next() else {
        return Ok(Classified::Unknown);
    };

    match op {
        'P' => read_power(token),
        'O' => read_output(token, Instruction::OutputOn),
        'F' => read_output(token, |motor| Instruction::OutputOff {
            motor,
            mode: StopMode::Float,
        }),
        'B' => read_output(token, |motor| Instruction::OutputOff {
            motor,
            mode: StopMode::Brake,
        }),
        'D' => read_direction(token),
        'W' => read_wait(token, &token[1..]),
        'S' => Ok(exact_or_prefix(Token::Send, &token[1..])),
        _ => Ok(Classified::Unknown),
    }
}

impl FromStr for Token {
    type Err = TokenError;

    /// Strict parse: the whole token must be one command
    fn from_str(token: &str) -> Result<Self, Self::Err> {
        match read(token)? {
            Classified::Exact(token) => Ok(token),
            Classified::Prefix { .. } => Err(TokenError::TrailingCharacters(token.into())),
            Classified::Unknown => Err(TokenError::Unknown(token.into())),
        }
    }
}
