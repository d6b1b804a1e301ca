/// JSON-RPC 2.0 standard error codes, plus the start of the range reserved
/// for implementation-defined codes. This crate does not allocate any of the
/// reserved codes itself; embedders may.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorCode(pub i32);

impl ErrorCode {
    pub const PARSE_ERROR: ErrorCode = ErrorCode(-32700);
    pub const INVALID_REQUEST: ErrorCode = ErrorCode(-32600);
    pub const METHOD_NOT_FOUND: ErrorCode = ErrorCode(-32601);
    pub const INVALID_PARAMS: ErrorCode = ErrorCode(-32602);
    pub const INTERNAL_ERROR: ErrorCode = ErrorCode(-32603);

    /// Start of the range JSON-RPC reserves for server-defined codes.
    pub const SERVER_ERROR_RANGE_START: i32 = -32099;
    pub const SERVER_ERROR_RANGE_END: i32 = -32000;

    pub const fn as_i32(self) -> i32 {
        self.0
    }
}

impl From<ErrorCode> for i32 {
    fn from(code: ErrorCode) -> Self {
        code.0
    }
}
