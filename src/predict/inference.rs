//! Train and predict pipelines

use std::path::PathBuf;

use crate::data::dataset::QuinielaDataset;
use crate::data::{Database, SeasonScope};
use crate::model::QuinielaModel;
use crate::predict::formatter::{annotate, AnnotatedPrediction};
use crate::training::Metrics;
use crate::{Config, Result};

/// Build the training table for `scope`, fit a model and save it under
/// the models directory. Returns the saved path.
pub fn run_train(config: &Config, scope: &SeasonScope, model_name: &str) -> Result<PathBuf> {
    log::info!("Training LaQuiniela model with seasons {}", scope);
    let db = Database::open(&config.data.database_path)?;
    let dataset =
        QuinielaDataset::for_training(&db, scope, config.features.training_season_encoding)?;

    let (model, history) = QuinielaModel::train(&dataset, &config.training)?;

    let targets: Vec<_> = dataset.rows.iter().filter_map(|r| r.winner).collect();
    let metrics = Metrics::evaluate(&model.predict_proba(&dataset.rows)?, &targets);
    log::info!(
        "Trained {} epochs on {} fixtures: accuracy {:.1}%, log loss {:.4}",
        history.epochs(),
        dataset.len(),
        metrics.accuracy() * 100.0,
        metrics.log_loss()
    );

    let path = config.model_path(model_name);
    model.save(&path)?;
    Ok(path)
}

/// Score one matchday with a saved model and append the predictions to
/// the store.
pub fn run_predict(
    config: &Config,
    season: &str,
    division: u8,
    matchday: u32,
    model_name: &str,
) -> Result<Vec<AnnotatedPrediction>> {
    log::info!(
        "Predicting matchday {} in season {}, division {}",
        matchday,
        season,
        division
    );
    let model = QuinielaModel::load(&config.model_path(model_name))?;

    let db = Database::open(&config.data.database_path)?;
    let dataset = QuinielaDataset::for_prediction(
        &db,
        season,
        division,
        matchday,
        model.encoding(),
        model.seasons(),
    )?;

    let probabilities = model.predict_proba(&dataset.rows)?;
    let predictions = annotate(&dataset.rows, &probabilities, &dataset.encoding)?;

    let records: Vec<_> = predictions.iter().map(AnnotatedPrediction::to_record).collect();
    let saved = db.save_predictions(&records)?;
    log::info!("Saved {} predictions", saved);

    Ok(predictions)
}
