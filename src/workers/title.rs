use super::{gather, lookup, version_error, DefineTable, Lookup, Messages, PackageDefaults, Worker};
use crate::error::Result;
use crate::parser::ParsedFile;
use crate::parsers::param::FieldKind;
use serde_json::{Map, Value};

/// Regroups the field declarations of one section by their declared group and
/// records each group's title in `local.<section>.groupTitles`.
///
/// The title comes from the `@apiDefine` block named like the group; groups
/// without one are titled by their own name.
pub struct FieldTitleWorker {
    kind: FieldKind,
    name: &'static str,
    messages: Messages,
}

impl FieldTitleWorker {
    pub fn new(kind: FieldKind) -> Self {
        let (name, messages) = match kind {
            FieldKind::Parameter => (
                "apiParamTitle",
                Messages {
                    element: "apiParam",
                    usage: "@apiParam (group) varname",
                    example: "@apiDefine MyValidParamGroup Some title\n@apiParam (MyValidParamGroup) username",
                },
            ),
            FieldKind::Header => (
                "apiHeaderTitle",
                Messages {
                    element: "apiHeader",
                    usage: "@apiHeader (group) varname",
                    example: "@apiDefine MyValidHeaderGroup Some title\n@apiHeader (MyValidHeaderGroup) Content-Type",
                },
            ),
            FieldKind::Success => (
                "apiSuccessTitle",
                Messages {
                    element: "apiSuccess",
                    usage: "@apiSuccess (group) varname",
                    example: "@apiDefine MyValidSuccessGroup Some title or 200 OK\n@apiSuccess (MyValidSuccessGroup) username",
                },
            ),
            FieldKind::Error => (
                "apiErrorTitle",
                Messages {
                    element: "apiError",
                    usage: "@apiError (group) varname",
                    example: "@apiDefine MyValidErrorGroup Some title or 40X Error\n@apiError (MyValidErrorGroup) username",
                },
            ),
        };
        Self { kind, name, messages }
    }
}

impl Worker for FieldTitleWorker {
    fn name(&self) -> &str {
        self.name
    }

    fn pre_process(&self, files: &[ParsedFile], defaults: &PackageDefaults) -> DefineTable {
        gather(files, "define", defaults, |_, definition| definition.clone())
    }

    fn post_process(&self, files: &mut [ParsedFile], table: &DefineTable, defaults: &PackageDefaults) -> Result<()> {
        for file in files.iter_mut() {
            for block in file.blocks.iter_mut() {
                let version = defaults.version_of(block).to_string();
                let section = match block.local.get_mut(self.kind.section()).and_then(Value::as_object_mut) {
                    Some(section) => section,
                    None => continue,
                };
                let fields = match section.get("fields").and_then(Value::as_object) {
                    Some(fields) => fields,
                    None => continue,
                };

                let mut regrouped: Map<String, Value> = Map::new();
                let mut titles: Map<String, Value> = Map::new();

                for (group_key, params) in fields {
                    for param in params.as_array().into_iter().flatten() {
                        let group = param.get("group").and_then(Value::as_str).unwrap_or(group_key).to_string();

                        if !titles.contains_key(&group) {
                            let title = match lookup(table, &group, &version, defaults) {
                                Lookup::Found(definition) => definition
                                    .get("title")
                                    .and_then(Value::as_str)
                                    .unwrap_or(&group)
                                    .to_string(),
                                Lookup::UnknownName => group.clone(),
                                Lookup::NoVersion(defined) => {
                                    return Err(version_error(
                                        &file.path,
                                        block.index,
                                        &self.messages,
                                        &group,
                                        &version,
                                        &defined,
                                    ))
                                }
                            };
                            titles.insert(group.clone(), Value::String(title));
                        }

                        if let Value::Array(items) = regrouped.entry(group).or_insert_with(|| Value::Array(Vec::new())) {
                            items.push(param.clone());
                        }
                    }
                }

                section.insert("fields".to_string(), Value::Object(regrouped));
                section.insert("groupTitles".to_string(), Value::Object(titles));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{block, file};
    use super::*;
    use serde_json::json;

    fn run(worker: &FieldTitleWorker, files: &mut [ParsedFile]) -> Result<()> {
        let defaults = PackageDefaults::default();
        let table = worker.pre_process(files, &defaults);
        worker.post_process(files, &table, &defaults)
    }

    #[test]
    fn test_titles_from_definitions() {
        let mut files = vec![file(
            "a.js",
            vec![
                block(json!({"define": {"name": "Login", "title": "Login credentials"}}), json!({})),
                block(
                    json!({}),
                    json!({"parameter": {"fields": {
                        "Login": [{"group": "Login", "field": "user"}],
                        "Parameter": [{"group": "Parameter", "field": "id"}]
                    }}}),
                ),
            ],
        )];

        run(&FieldTitleWorker::new(FieldKind::Parameter), &mut files).unwrap();

        let section = &files[0].blocks[1].local["parameter"];
        assert_eq!(section["groupTitles"], json!({"Login": "Login credentials", "Parameter": "Parameter"}));
        assert_eq!(section["fields"]["Login"][0]["field"], "user");
        assert_eq!(section["fields"]["Parameter"][0]["field"], "id");
    }

    #[test]
    fn test_fields_are_regrouped_by_declared_group() {
        let mut files = vec![file(
            "a.js",
            vec![block(
                json!({}),
                json!({"success": {"fields": {"Success 200": [
                    {"group": "Success 200", "field": "id"},
                    {"group": "Created", "field": "location"}
                ]}}}),
            )],
        )];

        run(&FieldTitleWorker::new(FieldKind::Success), &mut files).unwrap();

        let fields = &files[0].blocks[0].local["success"]["fields"];
        assert_eq!(fields["Success 200"], json!([{"group": "Success 200", "field": "id"}]));
        assert_eq!(fields["Created"], json!([{"group": "Created", "field": "location"}]));
    }

    #[test]
    fn test_other_sections_untouched() {
        let mut files = vec![file(
            "a.js",
            vec![block(json!({}), json!({"error": {"fields": {"Error 4xx": [{"field": "NotFound"}]}}}))],
        )];

        run(&FieldTitleWorker::new(FieldKind::Header), &mut files).unwrap();

        assert!(!files[0].blocks[0].local["error"].as_object().unwrap().contains_key("groupTitles"));
    }
}
