use crate::config::JwtAlgorithm;
use crate::error::AuthError;
use crate::jwt::claims::Claims;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};

/// Compact JWT encoding restricted to a single algorithm.
///
/// Time-based claims are not checked here; the token service applies them
/// against its own clock.
#[derive(Debug, Clone, Copy)]
pub struct JwtSerializer {
    algorithm: JwtAlgorithm,
}

impl JwtSerializer {
    pub fn new(algorithm: JwtAlgorithm) -> Self {
        JwtSerializer { algorithm }
    }

    pub fn serialize(
        &self,
        claims: &Claims,
        key: &EncodingKey,
        key_id: Option<&str>,
    ) -> Result<String, AuthError> {
        let mut header = Header::new(self.algorithm.to_jwt());
        header.kid = key_id.map(str::to_string);

        encode(&header, claims, key).map_err(|e| {
            AuthError::configuration(format!("JWT encoding failed with {}", self.algorithm))
                .with_cause(e)
        })
    }

    /// Verify the signature and decode the payload.
    ///
    /// Only the configured algorithm is accepted, whatever the header says.
    pub fn deserialize(&self, token: &str, key: &DecodingKey) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(self.algorithm.to_jwt());
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        let token_data = decode::<Claims>(token, key, &validation).map_err(AuthError::invalid)?;

        Ok(token_data.claims)
    }
}
