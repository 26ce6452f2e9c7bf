use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// The services the client factory knows how to build handles for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceName {
    S3,
    DynamoDb,
}

impl ServiceName {
    /// All recognized services, in provisioning order.
    pub const ALL: [ServiceName; 2] = [ServiceName::S3, ServiceName::DynamoDb];

    /// The identifier used on the command line and in error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceName::S3 => "s3",
            ServiceName::DynamoDb => "dynamodb",
        }
    }
}

impl fmt::Display for ServiceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "s3" => Ok(ServiceName::S3),
            "dynamodb" => Ok(ServiceName::DynamoDb),
            _ => Err(Error::UnsupportedService(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_services() {
        assert_eq!("s3".parse::<ServiceName>().unwrap(), ServiceName::S3);
        assert_eq!(
            "DynamoDB".parse::<ServiceName>().unwrap(),
            ServiceName::DynamoDb
        );
    }

    #[test]
    fn test_parse_rejects_unknown_service() {
        let err = "sqs".parse::<ServiceName>().unwrap_err();
        assert!(matches!(err, Error::UnsupportedService(ref name) if name == "sqs"));
    }

    #[test]
    fn test_display_matches_identifier() {
        for service in ServiceName::ALL {
            assert_eq!(service.to_string().parse::<ServiceName>().unwrap(), service);
        }
    }
}
