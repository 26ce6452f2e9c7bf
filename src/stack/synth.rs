use serde_json::{json, Map, Value};

use crate::dynamodb::TableDefinition;
use crate::s3::{ssl_only_policy, BucketDefinition, BucketEncryption};
use crate::stack::StackDefinition;

/// Renders `stack` as a CloudFormation template.
///
/// Stateful resources are retained when the stack is deleted.
pub fn synth(stack: &StackDefinition<'_>) -> Value {
    let mut resources = Map::new();

    resources.insert(
        stack.bucket_id.to_string(),
        retained("AWS::S3::Bucket", bucket_properties(&stack.bucket)),
    );
    if stack.bucket.ssl_enforced() {
        resources.insert(
            format!("{}Policy", stack.bucket_id),
            json!({
                "Type": "AWS::S3::BucketPolicy",
                "Properties": {
                    "Bucket": { "Ref": stack.bucket_id },
                    "PolicyDocument": ssl_only_policy(stack.bucket.name()),
                },
            }),
        );
    }
    resources.insert(
        stack.table_id.to_string(),
        retained("AWS::DynamoDB::Table", table_properties(&stack.table)),
    );

    json!({
        "AWSTemplateFormatVersion": "2010-09-09",
        "Description": format!("{} for local development", stack.name),
        "Resources": resources,
    })
}

fn retained(resource_type: &str, properties: Value) -> Value {
    json!({
        "Type": resource_type,
        "Properties": properties,
        "UpdateReplacePolicy": "Retain",
        "DeletionPolicy": "Retain",
    })
}

fn bucket_properties(bucket: &BucketDefinition<'_>) -> Value {
    let mut properties = Map::new();
    properties.insert("BucketName".into(), json!(bucket.name()));

    if bucket.is_versioned() {
        properties.insert(
            "VersioningConfiguration".into(),
            json!({ "Status": "Enabled" }),
        );
    }
    if bucket.encryption() == BucketEncryption::S3Managed {
        properties.insert(
            "BucketEncryption".into(),
            json!({
                "ServerSideEncryptionConfiguration": [{
                    "ServerSideEncryptionByDefault": { "SSEAlgorithm": "AES256" },
                }],
            }),
        );
    }
    if bucket.public_access_blocked() {
        properties.insert(
            "PublicAccessBlockConfiguration".into(),
            json!({
                "BlockPublicAcls": true,
                "BlockPublicPolicy": true,
                "IgnorePublicAcls": true,
                "RestrictPublicBuckets": true,
            }),
        );
    }
    if !bucket.cors_rules().is_empty() {
        let rules: Vec<Value> = bucket
            .cors_rules()
            .iter()
            .map(|rule| {
                json!({
                    "AllowedMethods": rule.allowed_methods,
                    "AllowedOrigins": rule.allowed_origins,
                    "AllowedHeaders": rule.allowed_headers,
                    "MaxAge": rule.max_age_seconds,
                })
            })
            .collect();
        properties.insert("CorsConfiguration".into(), json!({ "CorsRules": rules }));
    }

    Value::Object(properties)
}

fn table_properties(table: &TableDefinition<'_>) -> Value {
    let key_schema: Vec<Value> = table
        .keys()
        .into_iter()
        .map(|(name, role)| json!({ "AttributeName": name, "KeyType": role.code() }))
        .collect();
    let attribute_definitions: Vec<Value> = table
        .keys()
        .into_iter()
        .map(|(name, _)| json!({ "AttributeName": name, "AttributeType": table.key_type().code() }))
        .collect();

    let mut properties = Map::new();
    properties.insert("TableName".into(), json!(table.name()));
    properties.insert("KeySchema".into(), json!(key_schema));
    properties.insert("AttributeDefinitions".into(), json!(attribute_definitions));
    properties.insert("BillingMode".into(), json!("PAY_PER_REQUEST"));

    if table.point_in_time_recovery() {
        properties.insert(
            "PointInTimeRecoverySpecification".into(),
            json!({ "PointInTimeRecoveryEnabled": true }),
        );
    }
    if let Some(view) = table.stream() {
        properties.insert(
            "StreamSpecification".into(),
            json!({ "StreamViewType": view.code() }),
        );
    }
    if let Some(attribute) = table.ttl_attribute() {
        properties.insert(
            "TimeToLiveSpecification".into(),
            json!({ "AttributeName": attribute, "Enabled": true }),
        );
    }

    Value::Object(properties)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stack::base_stack;

    #[test]
    fn test_base_stack_template_resources() {
        let template = synth(&base_stack());
        let resources = template["Resources"].as_object().unwrap();

        assert_eq!(resources.len(), 3);
        assert_eq!(resources["StorageBucket"]["Type"], "AWS::S3::Bucket");
        assert_eq!(resources["StorageBucketPolicy"]["Type"], "AWS::S3::BucketPolicy");
        assert_eq!(resources["UserTable"]["Type"], "AWS::DynamoDB::Table");
        assert_eq!(resources["UserTable"]["DeletionPolicy"], "Retain");
    }

    #[test]
    fn test_bucket_properties() {
        let template = synth(&base_stack());
        let bucket = &template["Resources"]["StorageBucket"]["Properties"];

        assert_eq!(bucket["BucketName"], "my-application-storage");
        assert_eq!(bucket["VersioningConfiguration"]["Status"], "Enabled");
        assert_eq!(
            bucket["BucketEncryption"]["ServerSideEncryptionConfiguration"][0]
                ["ServerSideEncryptionByDefault"]["SSEAlgorithm"],
            "AES256"
        );
        assert_eq!(bucket["PublicAccessBlockConfiguration"]["BlockPublicAcls"], true);

        let cors = &bucket["CorsConfiguration"]["CorsRules"][0];
        assert_eq!(cors["AllowedMethods"], json!(["GET"]));
        assert_eq!(cors["AllowedOrigins"], json!(["*"]));
        assert_eq!(cors["MaxAge"], 3000);
    }

    #[test]
    fn test_table_properties() {
        let template = synth(&base_stack());
        let table = &template["Resources"]["UserTable"]["Properties"];

        assert_eq!(table["TableName"], "users");
        assert_eq!(
            table["KeySchema"],
            json!([
                { "AttributeName": "user_id", "KeyType": "HASH" },
                { "AttributeName": "email", "KeyType": "RANGE" },
            ])
        );
        assert_eq!(
            table["AttributeDefinitions"],
            json!([
                { "AttributeName": "user_id", "AttributeType": "S" },
                { "AttributeName": "email", "AttributeType": "S" },
            ])
        );
        assert_eq!(table["BillingMode"], "PAY_PER_REQUEST");
        assert_eq!(
            table["PointInTimeRecoverySpecification"]["PointInTimeRecoveryEnabled"],
            true
        );
        assert_eq!(table["StreamSpecification"]["StreamViewType"], "NEW_AND_OLD_IMAGES");
        assert_eq!(table["TimeToLiveSpecification"]["AttributeName"], "ttl");
    }

    #[test]
    fn test_ssl_policy_denies_insecure_transport() {
        let template = synth(&base_stack());
        let statement =
            &template["Resources"]["StorageBucketPolicy"]["Properties"]["PolicyDocument"]
                ["Statement"][0];

        assert_eq!(statement["Effect"], "Deny");
        assert_eq!(
            statement["Condition"]["Bool"]["aws:SecureTransport"],
            "false"
        );
        assert_eq!(
            statement["Resource"][1],
            "arn:aws:s3:::my-application-storage/*"
        );
    }
}
