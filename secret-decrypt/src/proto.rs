//! Protobuf shapes of a transaction's output data.
//!
//! Only the fields read while decrypting output data are declared, prost skips
//! every other field on decode.

use prost::Message;

/// Type url of the response to a contract instantiation
pub const INSTANTIATE_CONTRACT_RESPONSE_TYPE_URL: &str =
    "/secret.compute.v1beta1.MsgInstantiateContractResponse";

/// Type url of the response to a contract execution
pub const EXECUTE_CONTRACT_RESPONSE_TYPE_URL: &str =
    "/secret.compute.v1beta1.MsgExecuteContractResponse";

#[derive(Clone, PartialEq, Eq, Message)]
pub struct Any {
    #[prost(string, tag = "1")]
    pub type_url: String,
    #[prost(bytes = "vec", tag = "2")]
    pub value: Vec<u8>,
}

/// Output data of a transaction, one response per message
#[derive(Clone, PartialEq, Eq, Message)]
pub struct TxMsgData {
    #[prost(message, repeated, tag = "2")]
    pub msg_responses: Vec<Any>,
}

#[derive(Clone, PartialEq, Eq, Message)]
pub struct MsgExecuteContractResponse {
    #[prost(bytes = "vec", tag = "1")]
    pub data: Vec<u8>,
}

#[derive(Clone, PartialEq, Eq, Message)]
pub struct MsgInstantiateContractResponse {
    #[prost(string, tag = "1")]
    pub address: String,
    #[prost(bytes = "vec", tag = "2")]
    pub data: Vec<u8>,
}
