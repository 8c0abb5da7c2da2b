//! Just enough of the ERC-20 ABI to import a token and read balances

use num_bigint::BigUint;

use nevm_types::ImportedToken;
use nevm_util::units::format_units;

use super::{ChainClient, RpcError, parse_address};

type Result<T, E = RpcError> = std::result::Result<T, E>;

pub const BALANCE_OF: [u8; 4] = [0x70, 0xa0, 0x82, 0x31];
pub const DECIMALS: [u8; 4] = [0x31, 0x3c, 0xe5, 0x67];
pub const SYMBOL: [u8; 4] = [0x95, 0xd8, 0x9b, 0x41];
pub const NAME: [u8; 4] = [0x06, 0xfd, 0xde, 0x03];

const WORD: usize = 32;

/// `balanceOf(owner)` call data
pub fn balance_of_call(owner: &str) -> Result<Vec<u8>> {
    let owner = parse_address(owner)?;

    let mut data = Vec::with_capacity(4 + WORD);
    data.extend_from_slice(&BALANCE_OF);
    data.extend_from_slice(&[0; 12]);
    data.extend_from_slice(&owner);

    Ok(data)
}

/// Owner address from `balanceOf` call data
pub fn balance_of_owner(data: &[u8]) -> Option<[u8; 20]> {
    if data.len() != 4 + WORD || data[..4] != BALANCE_OF {
        return None;
    }

    data[4 + 12..].try_into().ok()
}

pub fn decode_uint(data: &[u8]) -> Result<BigUint> {
    let word = data
        .get(..WORD)
        .ok_or_else(|| invalid(format!("expected a 32 byte word, got {} bytes", data.len())))?;

    Ok(BigUint::from_bytes_be(word))
}

pub fn decode_decimals(data: &[u8]) -> Result<u8> {
    let value = decode_uint(data)?;

    u8::try_from(&value).map_err(|_| invalid(format!("decimals out of range: {value}")))
}

/// Decode an abi encoded `string`, older tokens return a `bytes32` instead
pub fn decode_string(data: &[u8]) -> Result<String> {
    if data.len() == WORD {
        let end = data.iter().rposition(|byte| *byte != 0).map_or(0, |index| index + 1);
        return utf8(&data[..end]);
    }

    let offset = word_as_usize(data, 0)?;
    let length = word_as_usize(data, offset)?;

    let start = offset + WORD;
    let bytes = start
        .checked_add(length)
        .and_then(|end| data.get(start..end))
        .ok_or_else(|| invalid(format!("string of {length} bytes overruns the response")))?;

    utf8(bytes)
}

fn word_as_usize(data: &[u8], at: usize) -> Result<usize> {
    let word = at
        .checked_add(WORD)
        .and_then(|end| data.get(at..end))
        .ok_or_else(|| invalid(format!("missing word at {at}")))?;

    let value = BigUint::from_bytes_be(word);
    usize::try_from(&value).map_err(|_| invalid(format!("value too large: {value}")))
}

fn utf8(bytes: &[u8]) -> Result<String> {
    String::from_utf8(bytes.to_vec()).map_err(|error| invalid(error.to_string()))
}

fn invalid(message: String) -> RpcError {
    RpcError::InvalidResponse(message)
}

pub async fn raw_balance(
    client: &dyn ChainClient,
    token_address: &str,
    owner: &str,
) -> Result<BigUint> {
    let data = client.call(token_address, &balance_of_call(owner)?).await?;
    decode_uint(&data)
}

/// Balance of `owner` formatted with the token's decimals, e.g. "12.5"
pub async fn token_balance(
    client: &dyn ChainClient,
    token: &ImportedToken,
    owner: &str,
) -> Result<String> {
    let balance = raw_balance(client, &token.address, owner).await?;
    Ok(format_units(&balance, token.decimals))
}

/// Read `name`, `symbol` and `decimals` from the contract
pub async fn token_metadata(client: &dyn ChainClient, address: &str) -> Result<ImportedToken> {
    parse_address(address)?;

    let (name, symbol, decimals) = futures::try_join!(
        client.call(address, &NAME),
        client.call(address, &SYMBOL),
        client.call(address, &DECIMALS),
    )?;

    Ok(ImportedToken {
        address: address.trim().to_string(),
        symbol: decode_string(&symbol)?,
        name: decode_string(&name)?,
        decimals: decode_decimals(&decimals)?,
    })
}

#[cfg(test)]
pub(crate) mod abi {
    //! encoders for building fake contract responses

    use num_bigint::BigUint;

    pub fn uint(value: impl Into<BigUint>) -> Vec<u8> {
        let bytes = value.into().to_bytes_be();
        let mut word = vec![0; 32 - bytes.len()];
        word.extend_from_slice(&bytes);
        word
    }

    pub fn string(value: &str) -> Vec<u8> {
        let mut data = uint(32u32);
        data.extend(uint(value.len() as u64));

        let mut bytes = value.as_bytes().to_vec();
        bytes.resize(value.len().div_ceil(32) * 32, 0);
        data.extend(bytes);
        data
    }
}
