use aws_config::BehaviorVersion;
use aws_lambda_events::event::s3::S3Event;
use lambda_runtime::{Error, LambdaEvent, run, service_fn};
use log::{error, info};
use std::sync::Arc;

use cmyk_normalizer::collaborators::{
    CloudFrontInvalidator, S3ObjectStore, SecretsManagerSource, SlackNotifier,
};
use cmyk_normalizer::config::AppConfig;
use cmyk_normalizer::handler::{InvocationReport, Services, handle_event};
use cmyk_normalizer::workflow::processors::image::DefaultCodec;
use cmyk_normalizer::workflow::processors::setup::initialize_logger;

async fn function_handler(
    event: LambdaEvent<S3Event>,
    services: &Services,
) -> Result<InvocationReport, Error> {
    info!("Lambda function started (request {})", event.context.request_id);
    let report = handle_event(services, &event.payload).await;

    if report.needs_redelivery() {
        error!("At least one file failed at a retryable stage; requesting re-delivery");
        return Err(serde_json::to_string(&report)
            .unwrap_or_else(|_| "retryable failure".to_string())
            .into());
    }
    Ok(report)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    initialize_logger();

    let config = AppConfig::from_env()?;
    let aws = aws_config::load_defaults(BehaviorVersion::latest()).await;

    let secrets = Arc::new(SecretsManagerSource::new(
        aws_sdk_secretsmanager::Client::new(&aws),
    ));
    let notifier = SlackNotifier::new(
        reqwest::Client::new(),
        secrets,
        config.slack_secret_id.clone(),
        config.slack_channel.clone(),
    );

    let services = Services {
        store: Arc::new(S3ObjectStore::new(
            aws_sdk_s3::Client::new(&aws),
            config.bucket_name.clone(),
        )),
        codec: Arc::new(DefaultCodec),
        cdn: Arc::new(CloudFrontInvalidator::new(aws_sdk_cloudfront::Client::new(
            &aws,
        ))),
        notifier: Arc::new(notifier),
        config,
    };

    run(service_fn(|event: LambdaEvent<S3Event>| {
        function_handler(event, &services)
    }))
    .await
}
