//! builtin functions available inside `${...}`
use hcl::eval::{Context, FuncArgs, FuncDef, ParamType};
use hcl::{Identifier, Value};

pub(crate) fn declare_builtins(context: &mut Context) {
    context.declare_func(
        Identifier::unchecked("upper"),
        FuncDef::builder().param(ParamType::String).build(upper),
    );
    context.declare_func(
        Identifier::unchecked("lower"),
        FuncDef::builder().param(ParamType::String).build(lower),
    );
    context.declare_func(
        Identifier::unchecked("trimspace"),
        FuncDef::builder().param(ParamType::String).build(trimspace),
    );
    context.declare_func(
        Identifier::unchecked("jsonencode"),
        FuncDef::builder().param(ParamType::String).build(jsonencode),
    );
    context.declare_func(
        Identifier::unchecked("replace"),
        FuncDef::builder()
            .param(ParamType::String)
            .param(ParamType::String)
            .param(ParamType::String)
            .build(replace),
    );
}

fn string_arg(args: &FuncArgs, index: usize) -> Result<&str, String> {
    args.get(index)
        .and_then(Value::as_str)
        .ok_or_else(|| format!("argument {index} must be a string"))
}

fn upper(args: FuncArgs) -> Result<Value, String> {
    Ok(string_arg(&args, 0)?.to_uppercase().into())
}

fn lower(args: FuncArgs) -> Result<Value, String> {
    Ok(string_arg(&args, 0)?.to_lowercase().into())
}

fn trimspace(args: FuncArgs) -> Result<Value, String> {
    Ok(string_arg(&args, 0)?.trim().into())
}

fn jsonencode(args: FuncArgs) -> Result<Value, String> {
    Ok(serde_json::Value::from(string_arg(&args, 0)?).to_string().into())
}

fn replace(args: FuncArgs) -> Result<Value, String> {
    let subject = string_arg(&args, 0)?;
    let search = string_arg(&args, 1)?;
    let replacement = string_arg(&args, 2)?;
    Ok(subject.replace(search, replacement).into())
}
