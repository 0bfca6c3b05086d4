use roslaunch_parser::{
    error::SubstitutionError,
    system::{StaticEnvironment, StaticPackages},
    ErrorKind, InterpretOptions, LaunchError, LaunchInterpreter, RuntimeModel,
};
use std::io::Write;
use tempfile::NamedTempFile;

fn interpreter() -> LaunchInterpreter {
    LaunchInterpreter::new()
        .with_packages(StaticPackages::default())
        .with_environment(StaticEnvironment::default().with_var("HOME", "/home/ros"))
}

fn parse_file(xml: &str, interpreter: &LaunchInterpreter) -> Result<RuntimeModel, LaunchError> {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(xml.as_bytes()).unwrap();
    file.flush().unwrap();
    interpreter.interpret_file(file.path(), [])
}

fn parse(xml: &str) -> Result<RuntimeModel, LaunchError> {
    parse_file(xml, &interpreter())
}

#[test]
fn test_empty_file() {
    let result = parse("");
    assert!(result.is_err(), "Empty file should produce an error");
}

#[test]
fn test_malformed_xml() {
    let xml = "<launch>\n  <node pkg=\"test\" type=\"test\"\n</launch>";

    let err = parse(xml).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::MalformedXml(_)));
    let err_msg = err.to_string();
    assert!(
        err_msg.contains("XML parsing error"),
        "Error should mention XML parsing: {}",
        err_msg
    );
}

#[test]
fn test_unclosed_tags() {
    let xml = "<launch>\n  <node pkg=\"test\" type=\"test\" name=\"test\">\n</launch>";
    let result = parse(xml);
    assert!(result.is_err(), "Unclosed tags should produce an error");
}

#[test]
fn test_wrong_root_element() {
    let err = parse("<robot><node pkg=\"a\" type=\"b\" name=\"c\"/></robot>").unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::MalformedXml(_)));
}

#[test]
fn test_empty_launch() {
    let model = parse("<launch></launch>").unwrap();
    assert_eq!(model, RuntimeModel::new());
}

#[test]
fn test_error_points_at_offending_line() {
    let xml = "<launch>\n  <arg name=\"a\" default=\"1\"/>\n  <node pkg=\"p\" type=\"t\" name=\"$(arg missing)\"/>\n</launch>";

    let err = parse(xml).unwrap_err();
    assert!(matches!(
        err.kind(),
        ErrorKind::Substitution(SubstitutionError::UndeclaredArgument(name)) if name == "missing"
    ));
    let location = err.location.as_ref().unwrap();
    assert_eq!(location.line, 3);
    assert!(location.file.is_some());
}

#[test]
fn test_missing_required_attribute() {
    let err = parse(r#"<launch><node pkg="p" name="n"/></launch>"#).unwrap_err();
    assert!(matches!(
        err.kind(),
        ErrorKind::MissingAttribute { element, attribute } if element == "node" && attribute == "type"
    ));
}

#[test]
fn test_conflicting_condition() {
    let err = parse(r#"<launch><group if="true" unless="false"/></launch>"#).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::ConflictingCondition(_)));
}

#[test]
fn test_malformed_boolean() {
    let err = parse(r#"<launch><node pkg="p" type="t" name="n" if="yes"/></launch>"#).unwrap_err();
    assert!(matches!(
        err.kind(),
        ErrorKind::MalformedBoolean { value, .. } if value == "yes"
    ));
}

#[test]
fn test_condition_is_case_insensitive() {
    let model = parse(
        r#"<launch>
            <node pkg="p" type="t" name="a" if="TRUE"/>
            <node pkg="p" type="t" name="b" if="1"/>
            <node pkg="p" type="t" name="c" unless="0"/>
        </launch>"#,
    )
    .unwrap();
    assert_eq!(model.nodes.len(), 3);
}

#[test]
fn test_unknown_element_warns_by_default() {
    let model = parse(
        r#"<launch>
            <executable cmd="rviz"/>
            <node pkg="p" type="t" name="n"><group/></node>
        </launch>"#,
    )
    .unwrap();
    assert_eq!(model.nodes.len(), 1);
}

#[test]
fn test_unknown_element_fails_when_strict() {
    let strict = interpreter().with_options(InterpretOptions::strict());
    let err = parse_file(r#"<launch><executable cmd="rviz"/></launch>"#, &strict).unwrap_err();
    assert!(matches!(
        err.kind(),
        ErrorKind::UnknownElement { parent, child } if parent == "launch" && child == "executable"
    ));

    let err = parse_file(
        r#"<launch><node pkg="p" type="t" name="n"><node pkg="p" type="t" name="m"/></node></launch>"#,
        &strict,
    )
    .unwrap_err();
    assert!(matches!(
        err.kind(),
        ErrorKind::UnknownElement { parent, child } if parent == "node" && child == "node"
    ));
}

#[test]
fn test_undefined_env_var() {
    let err = parse(r#"<launch><param name="p" value="$(env NOT_SET)"/></launch>"#).unwrap_err();
    assert!(matches!(
        err.kind(),
        ErrorKind::Substitution(SubstitutionError::UndefinedEnvVar(_))
    ));

    let model = parse(
        r#"<launch>
            <param name="home" value="$(env HOME)"/>
            <param name="fallback" value="$(optenv NOT_SET default value)"/>
        </launch>"#,
    )
    .unwrap();
    assert_eq!(model.parameters.len(), 2);
}

#[test]
fn test_package_not_found() {
    let err = parse(r#"<launch><include file="$(find nowhere)/a.launch"/></launch>"#).unwrap_err();
    assert!(matches!(
        err.kind(),
        ErrorKind::Substitution(SubstitutionError::PackageNotFound(name)) if name == "nowhere"
    ));
}

#[test]
fn test_missing_include_file() {
    let err = parse(r#"<launch><include file="/nonexistent/file.launch"/></launch>"#).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::FileNotFound { .. }));
    assert_eq!(err.location.unwrap().line, 1);
}

#[test]
fn test_unbalanced_substitution() {
    let err = parse(r#"<launch><param name="p" value="$(arg x"/></launch>"#).unwrap_err();
    assert!(matches!(
        err.kind(),
        ErrorKind::Substitution(SubstitutionError::Syntax { .. })
    ));
}

#[test]
fn test_eval_error() {
    let err = parse(
        r#"<launch>
            <arg name="n" default="3"/>
            <param name="p" value="$(eval n + 'x')"/>
        </launch>"#,
    )
    .unwrap_err();
    assert!(matches!(
        err.kind(),
        ErrorKind::Substitution(SubstitutionError::Eval(_))
    ));
}

#[test]
fn test_required_arg_without_value() {
    let err = parse(
        r#"<launch>
            <arg name="robot"/>
            <node pkg="p" type="t" name="$(arg robot)"/>
        </launch>"#,
    )
    .unwrap_err();
    assert!(matches!(
        err.kind(),
        ErrorKind::Substitution(SubstitutionError::UnsetArgument(name)) if name == "robot"
    ));
}

#[test]
fn test_node_name_with_namespace_is_rejected() {
    let err = parse(r#"<launch><node pkg="p" type="t" name="a/b"/></launch>"#).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::InvalidName { .. }));
}

#[test]
fn test_invalid_graph_names_are_rejected() {
    let err = parse(
        r#"<launch><group ns="bad name!">
            <remap from="1x" to="a b"/>
            <param name="p q" value="1"/>
            <node pkg="p" type="t" name="n-1"/>
        </group></launch>"#,
    )
    .unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::InvalidName { name, .. } if name == "bad name!"));
    assert_eq!(err.location.unwrap().line, 1);

    for (xml, bad) in [
        (r#"<launch><remap from="1x" to="a"/></launch>"#, "1x"),
        (r#"<launch><remap from="a" to="a b"/></launch>"#, "a b"),
        (r#"<launch><param name="p q" value="1"/></launch>"#, "p q"),
        (r#"<launch><node pkg="p" type="t" name="n-1"/></launch>"#, "n-1"),
        (r#"<launch><node pkg="p" type="t" name="n" ns="x/2"/></launch>"#, "x/2"),
        (r#"<launch><rosparam ns="a b">k: 1</rosparam></launch>"#, "a b"),
        (r#"<launch><rosparam param="k!">1</rosparam></launch>"#, "k!"),
    ] {
        let err = parse(xml).unwrap_err();
        assert!(
            matches!(err.kind(), ErrorKind::InvalidName { name, .. } if name == bad),
            "{}: {:?}",
            xml,
            err
        );
    }

    let model = parse(
        r#"<launch><group ns="/robot/">
            <remap from="~cmd" to="/cmd_vel"/>
            <param name="~rate" value="10"/>
            <node pkg="p" type="t" name="base_2" ns=""/>
        </group></launch>"#,
    )
    .unwrap();
    assert_eq!(model.nodes[0].name, "/robot/base_2");
}

#[test]
fn test_undeclared_machine() {
    let err = parse(r#"<launch><node pkg="p" type="t" name="n" machine="far"/></launch>"#)
        .unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::UndeclaredMachine(name) if name == "far"));
}

#[test]
fn test_machine_redefinition() {
    let model = parse(
        r#"<launch>
            <machine name="m" address="10.0.0.2"/>
            <machine name="m" address="10.0.0.2"/>
        </launch>"#,
    )
    .unwrap();
    assert_eq!(model.machines.len(), 1);

    let err = parse(
        r#"<launch>
            <machine name="m" address="10.0.0.2"/>
            <machine name="m" address="10.0.0.3"/>
        </launch>"#,
    )
    .unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::MachineConflict(_)));
}

#[test]
fn test_invalid_yaml_param() {
    let err = parse(r#"<launch><param name="p" type="yaml" value="[1, 2"/></launch>"#).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::InvalidYaml(_)));
}

#[test]
fn test_special_characters_in_values() {
    let model = parse(
        r#"<launch>
            <param name="price" value="$$5 &amp; up"/>
            <node pkg="p" type="t" name="n" args="--regex 'a(b)c'"/>
        </launch>"#,
    )
    .unwrap();
    assert_eq!(
        model.param("/price").unwrap().value,
        roslaunch_parser::model::ParamValue::Str("$5 & up".to_string())
    );
    assert_eq!(model.nodes[0].args, "--regex 'a(b)c'");
}
