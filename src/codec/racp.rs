//! Record Access Control Point (0x2A52).
//!
//! The client only ever asks for all stored records. Indications coming
//! back on the control point are decoded into [`RacpResponse`].

use core::fmt;

use crate::codec::Reader;
use crate::error::DecodeError;

pub mod op_code {
    pub const REPORT_STORED_RECORDS: u8 = 0x01;
    pub const DELETE_STORED_RECORDS: u8 = 0x02;
    pub const ABORT_OPERATION: u8 = 0x03;
    pub const REPORT_NUMBER_OF_STORED_RECORDS: u8 = 0x04;
    pub const NUMBER_OF_STORED_RECORDS_RESPONSE: u8 = 0x05;
    pub const RESPONSE_CODE: u8 = 0x06;
}

/// Operator byte of a RACP request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RacpOperator {
    Null = 0x00,
    AllRecords = 0x01,
    LessThanOrEqualTo = 0x02,
    GreaterThanOrEqualTo = 0x03,
    WithinRange = 0x04,
    FirstRecord = 0x05,
    LastRecord = 0x06,
}

/// Operand-less RACP requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RacpCommand {
    ReportStoredRecords(RacpOperator),
    ReportNumberOfStoredRecords(RacpOperator),
    AbortOperation,
}

impl RacpCommand {
    /// The request the subscription flow sends once everything is enabled.
    pub const REPORT_ALL: Self = Self::ReportStoredRecords(RacpOperator::AllRecords);

    pub const fn encode(self) -> [u8; 2] {
        match self {
            Self::ReportStoredRecords(op) => [op_code::REPORT_STORED_RECORDS, op as u8],
            Self::ReportNumberOfStoredRecords(op) => {
                [op_code::REPORT_NUMBER_OF_STORED_RECORDS, op as u8]
            }
            Self::AbortOperation => [op_code::ABORT_OPERATION, RacpOperator::Null as u8],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RacpResponseCode {
    Success,
    OpCodeNotSupported,
    InvalidOperator,
    OperatorNotSupported,
    InvalidOperand,
    NoRecordsFound,
    AbortUnsuccessful,
    ProcedureNotCompleted,
    OperandNotSupported,
    Other(u8),
}

impl From<u8> for RacpResponseCode {
    fn from(code: u8) -> Self {
        match code {
            0x01 => Self::Success,
            0x02 => Self::OpCodeNotSupported,
            0x03 => Self::InvalidOperator,
            0x04 => Self::OperatorNotSupported,
            0x05 => Self::InvalidOperand,
            0x06 => Self::NoRecordsFound,
            0x07 => Self::AbortUnsuccessful,
            0x08 => Self::ProcedureNotCompleted,
            0x09 => Self::OperandNotSupported,
            other => Self::Other(other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RacpResponse {
    /// `06 00 <request op-code> <response code>`
    ResponseCode {
        request_op_code: u8,
        response_code: RacpResponseCode,
    },
    /// `05 00 <count LE>`
    NumberOfStoredRecords(u16),
}

impl fmt::Display for RacpResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ResponseCode {
                request_op_code,
                response_code,
            } => write!(f, "response to op 0x{request_op_code:02X}: {response_code:?}"),
            Self::NumberOfStoredRecords(n) => write!(f, "{n} stored records"),
        }
    }
}

pub fn decode_racp_response(bytes: &[u8]) -> Result<RacpResponse, DecodeError> {
    let mut r = Reader::new(bytes);
    let op = r.u8()?;
    match op {
        op_code::RESPONSE_CODE => {
            let [_operator, request_op_code, code] = r.take::<3>()?;
            Ok(RacpResponse::ResponseCode {
                request_op_code,
                response_code: code.into(),
            })
        }
        op_code::NUMBER_OF_STORED_RECORDS_RESPONSE => {
            let _operator = r.u8()?;
            Ok(RacpResponse::NumberOfStoredRecords(r.u16_le()?))
        }
        other => Err(DecodeError::UnsupportedOpCode(other)),
    }
}
