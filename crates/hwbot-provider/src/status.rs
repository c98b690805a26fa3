use hwbot_schema::{HomeworkError, HomeworkRecord, HomeworkStatus};

/// Build the notification text for a homework whose review status changed.
pub fn parse_status(record: &HomeworkRecord) -> Result<String, HomeworkError> {
    let Some(name) = record.homework_name.as_deref() else {
        tracing::error!("homework record has no name: {record:?}");
        return Err(HomeworkError::MissingHomeworkName);
    };

    let status = match record.status.as_deref() {
        Some(raw) => raw.parse::<HomeworkStatus>(),
        None => Err(HomeworkError::UnknownStatus(None)),
    }
    .inspect_err(|e| tracing::error!("undocumented status for homework \"{name}\": {e}"))?;

    Ok(format!(
        "Изменился статус проверки работы \"{name}\". {}",
        status.verdict()
    ))
}
