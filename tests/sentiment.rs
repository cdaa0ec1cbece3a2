#![cfg(feature = "remote")]

use rust_tokenizers::tokenizer::{RobertaTokenizer, Tokenizer, TruncationStrategy};
use sentiment_api::pipelines::sentiment::{SentimentConfig, SentimentModel, SentimentPolarity};
use sentiment_api::pipelines::sequence_classification::SequenceClassificationModel;
use sentiment_api::resources::{RemoteResource, ResourceProvider};
use sentiment_api::roberta::{
    RobertaConfig, RobertaConfigResources, RobertaForSequenceClassification,
    RobertaMergesResources, RobertaModelResources, RobertaVocabResources,
};
use sentiment_api::server::Classifier;
use sentiment_api::{load_weights, Config};
use tch::{nn, no_grad, Device, Kind, Tensor};

fn cpu_config() -> SentimentConfig {
    SentimentConfig {
        device: Device::Cpu,
        ..Default::default()
    }
}

#[test]
#[cfg_attr(not(feature = "all-tests"), ignore)]
fn roberta_for_sequence_classification() -> anyhow::Result<()> {
    //    Resources paths
    let config_resource =
        RemoteResource::from_pretrained(RobertaConfigResources::TWITTER_ROBERTA_SENTIMENT);
    let vocab_resource =
        RemoteResource::from_pretrained(RobertaVocabResources::TWITTER_ROBERTA_SENTIMENT);
    let merges_resource =
        RemoteResource::from_pretrained(RobertaMergesResources::TWITTER_ROBERTA_SENTIMENT);
    let weights_resource =
        RemoteResource::from_pretrained(RobertaModelResources::TWITTER_ROBERTA_SENTIMENT);
    let config_path = config_resource.get_local_path()?;
    let vocab_path = vocab_resource.get_local_path()?;
    let merges_path = merges_resource.get_local_path()?;
    let weights_path = weights_resource.get_local_path()?;

    //    Set-up model
    let device = Device::Cpu;
    let mut vs = nn::VarStore::new(device);
    let tokenizer = RobertaTokenizer::from_file(&vocab_path, &merges_path, false, false)?;
    let mut config = RobertaConfig::from_file(config_path)?;
    config.output_attentions = Some(true);
    config.output_hidden_states = Some(true);
    let model = RobertaForSequenceClassification::new(vs.root(), &config)?;
    load_weights(&mut vs, weights_path)?;

    //    Define input
    let input = ["I love this!", "This is the worst day of my life."];
    let tokenized_input = tokenizer.encode_list(&input, 128, &TruncationStrategy::LongestFirst, 0);
    let max_len = tokenized_input
        .iter()
        .map(|input| input.token_ids.len())
        .max()
        .unwrap();
    let tokenized_input = tokenized_input
        .iter()
        .map(|input| input.token_ids.clone())
        .map(|mut input| {
            input.extend(vec![config.pad_token_id(); max_len - input.len()]);
            input
        })
        .map(|input| Tensor::from_slice(&input))
        .collect::<Vec<_>>();
    let input_tensor = Tensor::stack(tokenized_input.as_slice(), 0).to(device);
    let mask = input_tensor.ne(config.pad_token_id()).to_kind(Kind::Int64);

    //    Forward pass
    let model_output =
        no_grad(|| model.forward_t(&input_tensor, Some(&mask), None, None, false))?;

    assert_eq!(model_output.logits.size(), &[2, 3]);
    assert_eq!(model_output.logits.argmax(-1, false).int64_value(&[0]), 2);
    assert_eq!(model_output.logits.argmax(-1, false).int64_value(&[1]), 0);
    assert_eq!(
        config.num_hidden_layers as usize,
        model_output.all_hidden_states.unwrap().len()
    );
    assert_eq!(
        config.num_hidden_layers as usize,
        model_output.all_attentions.unwrap().len()
    );

    Ok(())
}

#[test]
#[cfg_attr(not(feature = "all-tests"), ignore)]
fn sentiment_positive_input() -> anyhow::Result<()> {
    let sentiment_model = SentimentModel::new(cpu_config())?;

    let output = sentiment_model.predict(&["I love this!"])?;

    assert_eq!(output.len(), 1);
    let scores = output[0].scores;
    assert_eq!(output[0].polarity, SentimentPolarity::Positive);
    assert!(scores.positive > scores.neutral);
    assert!(scores.positive > scores.negative);
    assert!((scores.negative + scores.neutral + scores.positive - 1.0).abs() <= 3e-4);
    Ok(())
}

#[test]
#[cfg_attr(not(feature = "all-tests"), ignore)]
fn sentiment_batch_and_edge_cases() -> anyhow::Result<()> {
    let sentiment_model = SentimentModel::new(cpu_config())?;

    let long_input = "The weather today is absolutely wonderful and I enjoy it. ".repeat(300);
    let input = [
        "I hate waiting in line for hours.",
        "",
        long_input.as_str(),
        "I love this!",
    ];
    let output = sentiment_model.predict(&input)?;

    assert_eq!(output.len(), 4);
    assert_eq!(output[0].polarity, SentimentPolarity::Negative);
    for sentiment in &output {
        let scores = sentiment.scores;
        let total = scores.negative + scores.neutral + scores.positive;
        assert!((total - 1.0).abs() <= 3e-4);
        let best = scores.negative.max(scores.neutral).max(scores.positive);
        assert_eq!(scores.get(sentiment.polarity), best);
    }

    // padding of the batch does not change individual predictions
    let alone = sentiment_model.predict(&["I love this!"])?;
    assert_eq!(alone[0].polarity, output[3].polarity);
    assert!((alone[0].scores.positive - output[3].scores.positive).abs() <= 2e-4);
    Ok(())
}

#[test]
#[cfg_attr(not(feature = "all-tests"), ignore)]
fn classification_is_deterministic() -> anyhow::Result<()> {
    let sentiment_model = SentimentModel::new(cpu_config())?;

    let first = sentiment_model.classify("Not sure how I feel about the new update.")?;
    let second = sentiment_model.classify("Not sure how I feel about the new update.")?;
    assert_eq!(first, second);
    Ok(())
}

#[test]
#[cfg_attr(not(feature = "all-tests"), ignore)]
fn sequence_classification_truncates_long_inputs() -> anyhow::Result<()> {
    let model = SequenceClassificationModel::new(cpu_config())?;

    let long_input = "word ".repeat(2000);
    let (input_ids, attention_mask) = model.prepare_for_model(&[long_input.as_str(), "short"]);
    assert_eq!(input_ids.size(), &[2, 512]);
    assert_eq!(attention_mask.size(), &[2, 512]);
    assert_eq!(attention_mask.get(0).sum(Kind::Int64).int64_value(&[]), 512);
    assert!(attention_mask.get(1).sum(Kind::Int64).int64_value(&[]) < 512);

    let labels = model.predict(&[long_input.as_str()])?;
    assert_eq!(labels.len(), 1);
    assert!(labels[0].text.starts_with("LABEL_"));
    assert!(labels[0].score > 0.0 && labels[0].score <= 1.0);
    Ok(())
}
