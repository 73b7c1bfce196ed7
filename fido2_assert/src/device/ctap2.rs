//! CTAP2 `authenticatorGetAssertion` / `authenticatorGetNextAssertion` CBOR
//! encoding, both for the client side and the token side.

use ciborium::value::{Integer, Value};

use super::errors::DeviceError;
use super::status::{CTAP2_ERR_INVALID_CBOR, CTAP2_ERR_MISSING_PARAMETER, CTAP2_OK};
use crate::assertion::{AllowedCredential, AssertionEntry, AssertionRequest, Transport};

pub const CTAP2_CMD_GET_ASSERTION: u8 = 0x02;
pub const CTAP2_CMD_GET_NEXT_ASSERTION: u8 = 0x08;

/// PIN/UV auth protocol number sent alongside `pinUvAuthParam`.
pub const PIN_UV_AUTH_PROTOCOL: i64 = 1;

const PUBLIC_KEY_TYPE: &str = "public-key";

/// One decoded get-assertion reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetAssertionReply {
    pub entry: AssertionEntry,
    /// Total number of assertions available, only present on the first reply
    /// of a discoverable-credential enumeration
    pub number_of_credentials: Option<usize>,
}

/// Encodes a get-assertion command: command byte followed by the CBOR
/// parameter map.
///
/// Options that are false are omitted so the authenticator's default
/// applies. `pin_uv_auth_param`, when given, is sent with protocol 1.
///
/// # Errors
/// * `DeviceError::InvalidArgument` - If the request lacks the client-data
///   hash or relying party
pub fn encode_get_assertion(
    request: &AssertionRequest,
    pin_uv_auth_param: Option<&[u8]>,
) -> Result<Vec<u8>, DeviceError> {
    let (Some(client_data_hash), Some(rp_id)) = (request.client_data_hash(), request.rp_id())
    else {
        return Err(DeviceError::InvalidArgument(
            "request needs a client data hash and a relying party".to_string(),
        ));
    };

    // 1: rpId, 2: clientDataHash
    let mut params = vec![
        (int(1), Value::Text(rp_id.to_string())),
        (int(2), Value::Bytes(client_data_hash.as_bytes().to_vec())),
    ];

    // 3: allowList
    if !request.allow_list().is_empty() {
        let descriptors = request
            .allow_list()
            .iter()
            .map(|cred| {
                let mut descriptor = vec![
                    (text("id"), Value::Bytes(cred.id().to_vec())),
                    (text("type"), text(PUBLIC_KEY_TYPE)),
                ];
                if !cred.transports().is_empty() {
                    let transports = cred.transports().iter().map(|t| text(t.as_str())).collect();
                    descriptor.push((text("transports"), Value::Array(transports)));
                }
                Value::Map(descriptor)
            })
            .collect();
        params.push((int(3), Value::Array(descriptors)));
    }

    // 5: options
    let options = request.options();
    let mut option_map = Vec::new();
    if options.user_presence {
        option_map.push((text("up"), Value::Bool(true)));
    }
    if options.user_verification {
        option_map.push((text("uv"), Value::Bool(true)));
    }
    if !option_map.is_empty() {
        params.push((int(5), Value::Map(option_map)));
    }

    // 6: pinUvAuthParam, 7: pinUvAuthProtocol
    if let Some(param) = pin_uv_auth_param {
        params.push((int(6), Value::Bytes(param.to_vec())));
        params.push((int(7), int(PIN_UV_AUTH_PROTOCOL)));
    }

    let mut buf = vec![CTAP2_CMD_GET_ASSERTION];
    ciborium::into_writer(&Value::Map(params), &mut buf)
        .map_err(|e| DeviceError::Transport(format!("CBOR encoding failed: {e}")))?;
    Ok(buf)
}

pub fn encode_get_next_assertion() -> Vec<u8> {
    vec![CTAP2_CMD_GET_NEXT_ASSERTION]
}

/// Decodes a get-assertion (or get-next-assertion) reply frame.
///
/// # Errors
/// * `DeviceError::Receive` - If the frame is empty
/// * `DeviceError::Status` - If the status byte is not zero
/// * `DeviceError::InvalidResponse` - If the CBOR body is malformed or lacks
///   authData / signature
pub fn decode_get_assertion_response(frame: &[u8]) -> Result<GetAssertionReply, DeviceError> {
    let (&status, body) = frame
        .split_first()
        .ok_or_else(|| DeviceError::Receive("empty reply".to_string()))?;
    if status != CTAP2_OK {
        return Err(DeviceError::Status(status));
    }

    let map = parse_cbor_map(body)
        .map_err(|e| DeviceError::InvalidResponse(format!("reply body: {e}")))?;

    // 1: credential descriptor, optional when the allow list had one entry
    let credential_id = match cbor_get(&map, 1) {
        Some(descriptor) => cbor_map(descriptor)
            .and_then(|m| cbor_get_str(m, "id"))
            .and_then(cbor_bytes)
            .ok_or_else(|| {
                DeviceError::InvalidResponse("malformed credential descriptor".to_string())
            })?
            .to_vec(),
        None => Vec::new(),
    };

    let auth_data = cbor_get(&map, 2)
        .and_then(cbor_bytes)
        .ok_or_else(|| DeviceError::InvalidResponse("missing authData".to_string()))?;
    let signature = cbor_get(&map, 3)
        .and_then(cbor_bytes)
        .ok_or_else(|| DeviceError::InvalidResponse("missing signature".to_string()))?;

    let mut entry = AssertionEntry::new(auth_data.to_vec(), signature.to_vec(), credential_id);
    if let Some(user_id) = cbor_get(&map, 4)
        .and_then(cbor_map)
        .and_then(|m| cbor_get_str(m, "id"))
        .and_then(cbor_bytes)
    {
        entry = entry.with_user_id(user_id.to_vec());
    }

    let number_of_credentials = match cbor_get(&map, 5) {
        Some(Value::Integer(n)) => Some(usize::try_from(u64::try_from(*n).map_err(|_| {
            DeviceError::InvalidResponse("negative numberOfCredentials".to_string())
        })?)
        .map_err(|_| DeviceError::InvalidResponse("numberOfCredentials overflow".to_string()))?),
        Some(_) => {
            return Err(DeviceError::InvalidResponse(
                "numberOfCredentials is not an integer".to_string(),
            ));
        }
        None => None,
    };

    Ok(GetAssertionReply {
        entry,
        number_of_credentials,
    })
}

/// Get-assertion parameters as seen by an authenticator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct GetAssertionCommand {
    pub rp_id: String,
    pub client_data_hash: Vec<u8>,
    pub allow_list: Vec<AllowedCredential>,
    pub up: Option<bool>,
    pub uv: Option<bool>,
    pub pin_uv_auth_param: Option<Vec<u8>>,
}

/// Token-side decoding of a get-assertion parameter map (without the command
/// byte). The error is the CTAP status byte to answer with.
pub(crate) fn decode_get_assertion_command(body: &[u8]) -> Result<GetAssertionCommand, u8> {
    let map = parse_cbor_map(body).map_err(|_| CTAP2_ERR_INVALID_CBOR)?;

    let rp_id = cbor_get(&map, 1)
        .and_then(cbor_text)
        .ok_or(CTAP2_ERR_MISSING_PARAMETER)?
        .to_string();
    let client_data_hash = cbor_get(&map, 2)
        .and_then(cbor_bytes)
        .ok_or(CTAP2_ERR_MISSING_PARAMETER)?
        .to_vec();

    let allow_list = match cbor_get(&map, 3) {
        Some(list) => cbor_array(list)
            .ok_or(CTAP2_ERR_INVALID_CBOR)?
            .iter()
            .filter_map(|item| {
                let m = cbor_map(item)?;
                let id = cbor_get_str(m, "id").and_then(cbor_bytes)?;
                // Unknown transport names are skipped
                let transports = cbor_get_str(m, "transports")
                    .and_then(cbor_array)
                    .map(|names| {
                        names
                            .iter()
                            .filter_map(cbor_text)
                            .filter_map(Transport::from_name)
                            .collect()
                    })
                    .unwrap_or_default();
                Some(AllowedCredential {
                    id: id.to_vec(),
                    transports,
                })
            })
            .collect(),
        None => Vec::new(),
    };

    let options = cbor_get(&map, 5).and_then(cbor_map);
    let option = |name: &str| options.and_then(|m| cbor_get_str(m, name)).and_then(cbor_bool);

    Ok(GetAssertionCommand {
        rp_id,
        client_data_hash,
        allow_list,
        up: option("up"),
        uv: option("uv"),
        pin_uv_auth_param: cbor_get(&map, 6).and_then(cbor_bytes).map(<[u8]>::to_vec),
    })
}

/// Token-side encoding of a successful get-assertion reply frame.
pub(crate) fn encode_get_assertion_response(
    entry: &AssertionEntry,
    number_of_credentials: Option<usize>,
) -> Result<Vec<u8>, DeviceError> {
    let mut fields = Vec::new();
    if !entry.credential_id().is_empty() {
        fields.push((
            int(1),
            Value::Map(vec![
                (text("id"), Value::Bytes(entry.credential_id().to_vec())),
                (text("type"), text(PUBLIC_KEY_TYPE)),
            ]),
        ));
    }
    fields.push((int(2), Value::Bytes(entry.authenticator_data().to_vec())));
    fields.push((int(3), Value::Bytes(entry.signature().to_vec())));
    if let Some(user_id) = entry.user_id() {
        fields.push((
            int(4),
            Value::Map(vec![(text("id"), Value::Bytes(user_id.to_vec()))]),
        ));
    }
    if let Some(n) = number_of_credentials {
        fields.push((int(5), Value::Integer(Integer::from(n as u64))));
    }

    let mut buf = vec![CTAP2_OK];
    ciborium::into_writer(&Value::Map(fields), &mut buf)
        .map_err(|e| DeviceError::Internal(format!("CBOR encoding failed: {e}")))?;
    Ok(buf)
}

fn int(value: i64) -> Value {
    Value::Integer(value.into())
}

fn text(value: &str) -> Value {
    Value::Text(value.to_string())
}

fn parse_cbor_map(data: &[u8]) -> Result<Vec<(Value, Value)>, String> {
    let value: Value = ciborium::from_reader(data).map_err(|e| e.to_string())?;
    match value {
        Value::Map(map) => Ok(map),
        _ => Err("expected map".to_string()),
    }
}

fn cbor_get(map: &[(Value, Value)], key: i64) -> Option<&Value> {
    let target = int(key);
    map.iter().find(|(k, _)| k == &target).map(|(_, v)| v)
}

fn cbor_get_str<'a>(map: &'a [(Value, Value)], key: &str) -> Option<&'a Value> {
    map.iter()
        .find(|(k, _)| matches!(k, Value::Text(s) if s == key))
        .map(|(_, v)| v)
}

fn cbor_bytes(v: &Value) -> Option<&[u8]> {
    match v {
        Value::Bytes(b) => Some(b),
        _ => None,
    }
}

fn cbor_text(v: &Value) -> Option<&str> {
    match v {
        Value::Text(s) => Some(s),
        _ => None,
    }
}

fn cbor_bool(v: &Value) -> Option<bool> {
    match v {
        Value::Bool(b) => Some(*b),
        _ => None,
    }
}

fn cbor_map(v: &Value) -> Option<&[(Value, Value)]> {
    match v {
        Value::Map(m) => Some(m),
        _ => None,
    }
}

fn cbor_array(v: &Value) -> Option<&[Value]> {
    match v {
        Value::Array(a) => Some(a),
        _ => None,
    }
}
