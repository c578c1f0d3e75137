//! Generic resource command driver
//!
//! [`ResourceCommand`] implements `list`, `get`, `add`, `update` and
//! `remove` once, parameterized by a [`ResourceDescriptor`]. Every call is
//! first built as an [`ApiRequest`], then either executed through the
//! [`RestTransport`] or, in dry-run mode, printed instead.

use super::prompt::{Prompter, Question};
use super::resolve::{classify, lookup_request, match_by_name, record_id, Identifier};
use crate::api::{ApiRequest, ResourceEndpoint, RestTransport};
use crate::error::{CommandError, CommandResult};
use crate::output::{render_list, render_record, render_value, Console, OutputFormat};
use crate::resource::payload::{
    claim_assignments, has_path, parse_assignments, parse_payload, set_path, typed_value, Assignment,
};
use crate::resource::{
    display_value, sorted, InputType, OptionType, ResourceDescriptor, ResourceRegistry,
    SelectOption, TypeDescriptor,
};
use serde_json::{json, Map, Value};

/// Flags shared by every resource action
#[derive(Debug, Clone, Default)]
pub struct CommandOptions {
    pub format: OutputFormat,
    pub fields: Vec<String>,
    pub dry_run: bool,
    pub yes: bool,
    /// Parent id or name for nested resources
    pub parent: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ListArgs {
    pub phrase: Vec<String>,
    pub max: Option<i64>,
    pub offset: Option<i64>,
    pub sort: Option<String>,
    pub desc: bool,
}

impl ListArgs {
    fn query(&self) -> Vec<(String, String)> {
        let mut query = Vec::new();
        let phrase = self.phrase.join(" ");
        if !phrase.trim().is_empty() {
            query.push(("phrase".to_string(), phrase));
        }
        if let Some(max) = self.max {
            query.push(("max".to_string(), max.to_string()));
        }
        if let Some(offset) = self.offset {
            query.push(("offset".to_string(), offset.to_string()));
        }
        if let Some(sort) = &self.sort {
            query.push(("sort".to_string(), sort.clone()));
        }
        if self.desc {
            query.push(("direction".to_string(), "desc".to_string()));
        }
        query
    }
}

#[derive(Debug, Clone, Default)]
pub struct AddArgs {
    /// Type code, name or id for typed resources
    pub type_code: Option<String>,
    /// `field=value` assignments
    pub assignments: Vec<String>,
    /// Base payload: inline JSON object or `@file`
    pub payload: Option<String>,
    /// Also prompt for advanced fields
    pub advanced: bool,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateArgs {
    pub assignments: Vec<String>,
    pub payload: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct RemoveArgs {
    pub force: bool,
}

/// One resource type's commands for a single invocation
pub struct ResourceCommand<'a> {
    registry: &'a ResourceRegistry,
    descriptor: &'a ResourceDescriptor,
    transport: &'a dyn RestTransport,
    prompter: Box<dyn Prompter>,
    console: Console,
    options: CommandOptions,
}

impl<'a> ResourceCommand<'a> {
    pub fn new(
        registry: &'a ResourceRegistry,
        descriptor: &'a ResourceDescriptor,
        transport: &'a dyn RestTransport,
        prompter: Box<dyn Prompter>,
        console: Console,
        options: CommandOptions,
    ) -> Self {
        Self {
            registry,
            descriptor,
            transport,
            prompter,
            console,
            options,
        }
    }

    /// List records, optionally filtered by a search phrase
    pub async fn list(&mut self, args: &ListArgs) -> CommandResult<()> {
        let endpoint = self.endpoint().await?;
        let request = endpoint.list(args.query());
        tracing::info!("list {}", self.descriptor.key);

        let Some(response) = self.dispatch(request).await? else {
            return Ok(());
        };

        let empty = response
            .get(&self.descriptor.list_key)
            .and_then(|v| v.as_array())
            .map_or(true, |items| items.is_empty());
        if empty && self.options.format == OutputFormat::Table {
            self.console.print(format!(
                "No {} found.",
                self.descriptor.label_plural.to_lowercase()
            ))?;
            return Ok(());
        }

        let rendered = render_list(
            self.descriptor,
            &response,
            self.options.format,
            &self.options.fields,
        )?;
        self.console.print(rendered)?;
        Ok(())
    }

    /// Show one or more records by id or name
    ///
    /// Each identifier is fetched on its own. A failure is reported and the
    /// remaining identifiers are still shown; the command fails if any did.
    pub async fn get(&mut self, identifiers: &[String]) -> CommandResult<()> {
        if identifiers.is_empty() {
            return Err(CommandError::Validation(format!(
                "expected at least one {} id or name",
                self.descriptor.label
            )));
        }

        let endpoint = self.endpoint().await?;
        tracing::info!("get {} {:?}", self.descriptor.key, identifiers);

        if let [single] = identifiers {
            return self.get_one(&endpoint, single).await;
        }

        let mut failed = 0;
        for raw in identifiers {
            if let Err(err) = self.get_one(&endpoint, raw).await {
                tracing::warn!("get {} {} failed: {}", self.descriptor.key, raw, err);
                self.console.error(&err);
                failed += 1;
            }
        }

        if failed > 0 {
            return Err(CommandError::Failures {
                failed,
                total: identifiers.len(),
                label: self.descriptor.label_plural.to_lowercase(),
            });
        }
        Ok(())
    }

    async fn get_one(&mut self, endpoint: &ResourceEndpoint, raw: &str) -> CommandResult<()> {
        let descriptor = self.descriptor;
        let id = self.resolve_id(descriptor, endpoint, raw).await?;
        let not_found = format!("{} {} not found", descriptor.label, raw);

        let response = self
            .dispatch(endpoint.get(&id))
            .await
            .map_err(|e| e.with_not_found(not_found))?;
        if let Some(response) = response {
            self.show_record(&response)?;
        }
        Ok(())
    }

    /// Create a record from assignments, prompts and defaults
    pub async fn add(&mut self, args: &AddArgs) -> CommandResult<()> {
        self.ensure_writable()?;
        let descriptor = self.descriptor;
        let endpoint = self.endpoint().await?;

        let mut assignments = parse_assignments(&args.assignments)?;
        let mut payload = match &args.payload {
            Some(raw) => parse_payload(raw)?,
            None => Map::new(),
        };

        let mut option_types = Vec::new();
        match &descriptor.type_def {
            Some(type_def) => {
                let (code, type_options) =
                    self.resolve_type(type_def, args.type_code.as_deref()).await?;
                set_path(&mut payload, &type_def.field, json!({ "code": code }));
                option_types.extend(sorted(type_options));
            }
            None if args.type_code.is_some() => {
                return Err(CommandError::Validation(format!(
                    "{} do not have types",
                    descriptor.label_plural
                )));
            }
            None => {}
        }
        option_types.extend(sorted(descriptor.option_types.clone()));
        let advanced = sorted(descriptor.advanced_option_types.clone());

        let fields: Vec<(&OptionType, bool)> = option_types
            .iter()
            .map(|option| (option, true))
            .chain(advanced.iter().map(|option| (option, args.advanced)))
            .collect();
        let options: Vec<&OptionType> = fields.iter().map(|(option, _)| *option).collect();
        let claimed = claim_assignments(&mut assignments, &options);

        let mut missing = Vec::new();
        for ((option, may_prompt), assignment) in fields.into_iter().zip(claimed) {
            self.fill_field(&mut payload, assignment, option, may_prompt, &mut missing)
                .await?;
        }

        if !missing.is_empty() {
            return Err(CommandError::Validation(format!(
                "missing required fields: {}",
                missing.join(", ")
            )));
        }

        for Assignment { path, raw } in assignments {
            set_path(&mut payload, &path, Value::String(raw));
        }

        let body = json!({ descriptor.object_key.as_str(): Value::Object(payload) });
        tracing::info!("add {}", descriptor.key);

        if let Some(response) = self.dispatch(endpoint.create(body)).await? {
            self.show_record(&response)?;
        }
        Ok(())
    }

    /// Send only the explicitly supplied fields of a record
    pub async fn update(&mut self, raw: &str, args: &UpdateArgs) -> CommandResult<()> {
        self.ensure_writable()?;
        let descriptor = self.descriptor;
        let endpoint = self.endpoint().await?;
        let id = self.resolve_id(descriptor, &endpoint, raw).await?;

        let mut payload = match &args.payload {
            Some(raw) => parse_payload(raw)?,
            None => Map::new(),
        };
        for assignment in parse_assignments(&args.assignments)? {
            let option = descriptor
                .option_types
                .iter()
                .chain(&descriptor.advanced_option_types)
                .find(|o| o.path() == assignment.path || o.field_name == assignment.path);
            let path = option.map(|o| o.path()).unwrap_or(assignment.path.clone());
            set_path(&mut payload, &path, typed_value(option, &assignment.raw)?);
        }

        let body = json!({ descriptor.object_key.as_str(): Value::Object(payload) });
        tracing::info!("update {} {}", descriptor.key, id);

        let not_found = format!("{} {} not found", descriptor.label, raw);
        let response = self
            .dispatch(endpoint.update(&id, body))
            .await
            .map_err(|e| e.with_not_found(not_found))?;

        if let Some(response) = response {
            if response.get(&descriptor.object_key).is_some() {
                self.show_record(&response)?;
            } else {
                self.console
                    .print(format!("Updated {} {}", descriptor.label, raw))?;
            }
        }
        Ok(())
    }

    /// Delete a record after confirmation
    pub async fn remove(&mut self, raw: &str, args: &RemoveArgs) -> CommandResult<()> {
        self.ensure_writable()?;
        let descriptor = self.descriptor;
        let endpoint = self.endpoint().await?;
        let id = self.resolve_id(descriptor, &endpoint, raw).await?;

        if !self.options.dry_run && !self.options.yes {
            let question = format!(
                "Are you sure you want to delete the {} {}?",
                descriptor.label.to_lowercase(),
                raw
            );
            if !self.prompter.confirm(&question)? {
                tracing::info!("remove {} {} declined", descriptor.key, id);
                return Err(CommandError::Aborted);
            }
        }

        let mut request = endpoint.destroy(&id);
        if args.force {
            request = request.with_query("force", "true");
        }
        tracing::info!("remove {} {}", descriptor.key, id);

        let not_found = format!("{} {} not found", descriptor.label, raw);
        let response = self
            .dispatch(request)
            .await
            .map_err(|e| e.with_not_found(not_found))?;
        if response.is_some() {
            self.console
                .print(format!("Removed {} {}", descriptor.label, raw))?;
        }
        Ok(())
    }

    fn ensure_writable(&self) -> CommandResult<()> {
        if self.descriptor.read_only {
            return Err(CommandError::Validation(format!(
                "{} are read-only",
                self.descriptor.label_plural
            )));
        }
        Ok(())
    }

    /// Endpoint for this resource, resolving `--parent` for nested resources
    async fn endpoint(&mut self) -> CommandResult<ResourceEndpoint> {
        let descriptor = self.descriptor;
        let registry = self.registry;
        let Some(parent_def) = registry.parent_of(descriptor) else {
            if self.options.parent.is_some() {
                return Err(CommandError::Validation(format!(
                    "{} are not nested under another resource",
                    descriptor.label_plural
                )));
            }
            return Ok(ResourceEndpoint::new(descriptor, None));
        };

        let raw_parent = self.options.parent.clone().ok_or_else(|| {
            CommandError::Validation(format!(
                "--parent is required: {} belong to a {}",
                descriptor.label_plural.to_lowercase(),
                parent_def.label.to_lowercase()
            ))
        })?;

        let parent_endpoint = ResourceEndpoint::new(parent_def, None);
        let parent_id = self
            .resolve_id(parent_def, &parent_endpoint, &raw_parent)
            .await?;
        Ok(ResourceEndpoint::new(descriptor, Some((parent_def, parent_id.as_str()))))
    }

    /// Resolve an id or name to a record id
    ///
    /// In dry-run mode the lookup request is printed and the raw name is
    /// returned unresolved.
    async fn resolve_id(
        &mut self,
        descriptor: &ResourceDescriptor,
        endpoint: &ResourceEndpoint,
        raw: &str,
    ) -> CommandResult<String> {
        match classify(descriptor, raw)? {
            Identifier::Id(id) => Ok(id.to_string()),
            Identifier::Name(name) => {
                let Some(response) = self.dispatch(lookup_request(endpoint, name)).await? else {
                    return Ok(name.to_string());
                };
                let record = match_by_name(descriptor, &response, name)?;
                let id = record_id(&record).ok_or_else(|| {
                    CommandError::Transport(format!(
                        "{} '{}' has no id in the response",
                        descriptor.label, name
                    ))
                })?;
                tracing::debug!("resolved {} '{}' to id {}", descriptor.key, name, id);
                Ok(id)
            }
        }
    }

    /// Pick the type for `add` and return its code and option types
    async fn resolve_type(
        &mut self,
        type_def: &TypeDescriptor,
        requested: Option<&str>,
    ) -> CommandResult<(String, Vec<OptionType>)> {
        if self.options.dry_run {
            let code = requested
                .map(str::to_string)
                .or_else(|| type_def.default.clone())
                .ok_or_else(|| {
                    CommandError::Validation(format!("--type is required ({})", type_def.label))
                })?;
            return Ok((code, Vec::new()));
        }

        let request = ApiRequest::get(type_def.path.clone()).with_query("max", "-1");
        let response = self.execute(&request).await?;
        let types: Vec<Value> = response
            .get(&type_def.list_key)
            .and_then(|v| v.as_array())
            .cloned()
            .unwrap_or_default();

        let wanted = match requested {
            Some(requested) => requested.to_string(),
            None if self.prompter.is_interactive() => {
                let choices: Vec<SelectOption> = types
                    .iter()
                    .map(|t| SelectOption {
                        name: t.get("name").map(display_value).unwrap_or_default(),
                        value: t.get("code").cloned().unwrap_or(Value::Null),
                    })
                    .collect();
                let question = Question {
                    label: &type_def.label,
                    required: true,
                    default: type_def.default.clone(),
                    choices: &choices,
                    help: None,
                    secret: false,
                };
                match self.prompter.ask(&question)? {
                    Some(answer) => answer,
                    None => type_def.default.clone().ok_or_else(|| {
                        CommandError::Validation(format!("{} is required", type_def.label))
                    })?,
                }
            }
            None => type_def.default.clone().ok_or_else(|| {
                let codes: Vec<String> = types
                    .iter()
                    .filter_map(|t| t.get("code").map(display_value))
                    .collect();
                CommandError::Validation(format!(
                    "--type is required, available: {}",
                    codes.join(", ")
                ))
            })?,
        };

        let chosen = types
            .iter()
            .find(|t| {
                ["code", "name", "id"]
                    .iter()
                    .any(|key| t.get(*key).map(display_value).as_deref() == Some(wanted.as_str()))
            })
            .ok_or_else(|| {
                CommandError::NotFound(format!("{} '{}' not found", type_def.label, wanted))
            })?;

        let code = chosen
            .get("code")
            .map(display_value)
            .unwrap_or_else(|| wanted.clone());
        let option_types = match chosen.get("optionTypes") {
            Some(value) => serde_json::from_value::<Vec<OptionType>>(value.clone()).map_err(|e| {
                CommandError::Transport(format!(
                    "unexpected option types for {} '{}': {}",
                    type_def.label, code, e
                ))
            })?,
            None => Vec::new(),
        };
        tracing::debug!("type {} has {} option types", code, option_types.len());
        Ok((code, option_types))
    }

    /// Set one field of an `add` payload
    async fn fill_field(
        &mut self,
        payload: &mut Map<String, Value>,
        assignment: Option<Assignment>,
        option: &OptionType,
        may_prompt: bool,
        missing: &mut Vec<String>,
    ) -> CommandResult<()> {
        let path = option.path();
        if let Some(assignment) = assignment {
            set_path(payload, &path, typed_value(Some(option), &assignment.raw)?);
            return Ok(());
        }
        if has_path(payload, &path) {
            return Ok(());
        }

        let value = if option.input_type != InputType::Hidden
            && may_prompt
            && self.prompter.is_interactive()
        {
            self.prompt_field(option).await?
        } else {
            typed_default(option)?
        };

        match value {
            Some(value) => set_path(payload, &path, value),
            None if option.required => missing.push(path),
            None => {}
        }
        Ok(())
    }

    async fn prompt_field(&mut self, option: &OptionType) -> CommandResult<Option<Value>> {
        let choices = if !option.options.is_empty() {
            option.options.clone()
        } else {
            match &option.option_source {
                Some(source) if !self.options.dry_run => {
                    source.load(self.transport, self.registry).await?
                }
                _ => Vec::new(),
            }
        };

        let question = Question::for_option(option, &choices);

        match self.prompter.ask(&question)? {
            Some(answer) => Ok(Some(typed_value(Some(option), &answer)?)),
            None => typed_default(option),
        }
    }

    fn show_record(&mut self, response: &Value) -> CommandResult<()> {
        let record = response
            .get(&self.descriptor.object_key)
            .unwrap_or(response);
        let rendered = render_record(
            self.descriptor,
            record,
            self.options.format,
            &self.options.fields,
        )?;
        self.console.print(rendered)?;
        Ok(())
    }

    async fn execute(&self, request: &ApiRequest) -> CommandResult<Value> {
        tracing::debug!("{} {}", request.method, request.path_and_query());
        Ok(self.transport.execute(request).await?)
    }

    /// Execute `request`, or print it and return `None` in dry-run mode
    async fn dispatch(&mut self, request: ApiRequest) -> CommandResult<Option<Value>> {
        if !self.options.dry_run {
            return self.execute(&request).await.map(Some);
        }

        let rendered = match self.options.format {
            OutputFormat::Json | OutputFormat::Yaml => {
                render_value(&serde_json::to_value(&request)?, self.options.format)?
            }
            _ => format!("DRY RUN\n{}", request),
        };
        self.console.print(rendered)?;
        Ok(None)
    }
}

/// The option's default, typed like an entered value
fn typed_default(option: &OptionType) -> CommandResult<Option<Value>> {
    match option.default() {
        Some(Value::String(raw)) => typed_value(Some(option), raw).map(Some),
        Some(value) => Ok(Some(value.clone())),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_query_parameters() {
        let args = ListArgs {
            phrase: vec!["nightly".into(), "db".into()],
            max: Some(25),
            offset: Some(50),
            sort: Some("name".into()),
            desc: true,
        };
        assert_eq!(
            args.query(),
            vec![
                ("phrase".to_string(), "nightly db".to_string()),
                ("max".to_string(), "25".to_string()),
                ("offset".to_string(), "50".to_string()),
                ("sort".to_string(), "name".to_string()),
                ("direction".to_string(), "desc".to_string()),
            ]
        );
    }

    #[test]
    fn test_empty_list_query() {
        assert!(ListArgs::default().query().is_empty());
    }

    #[test]
    fn test_typed_default_checkbox() {
        let option: OptionType = serde_json::from_value(json!({
            "fieldName": "enabled",
            "type": "checkbox",
            "defaultValue": "on"
        }))
        .unwrap();
        assert_eq!(typed_default(&option).unwrap(), Some(json!(true)));
    }
}
