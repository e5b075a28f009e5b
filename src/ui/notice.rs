use crate::error::{LoadError, LoadErrorKind};

/// Turn a load error into the text shown to the user.
pub fn user_message(err: &LoadError) -> String {
    let dataset = err.dataset.label();
    match err.kind {
        LoadErrorKind::PathNotFound => {
            format!("Could not find the {dataset}. Upload the CSV file to continue.")
        }
        LoadErrorKind::ParseFailure => {
            format!("The {dataset} could not be read as CSV: {}", err.detail)
        }
        LoadErrorKind::FetchFailure => {
            format!("Downloading the {dataset} failed: {}", err.detail)
        }
        LoadErrorKind::MissingRequiredDataset => format!(
            "The dashboard cannot be shown because the {dataset} is unavailable ({}).",
            err.detail
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatasetKind;

    #[test]
    fn messages_name_the_dataset() {
        let err = LoadError::parse(DatasetKind::Segmentation, "line 3: expected 2 fields, found 1");
        let text = user_message(&err);
        assert!(text.contains("segmentation dataset"));
        assert!(text.contains("line 3"));

        let fatal = LoadError::missing(DatasetKind::Activity);
        assert!(user_message(&fatal).starts_with("The dashboard cannot be shown"));
    }
}
