//! Code generation for the repetitive per-vector interrupt stubs.
//!
//! 32-bit protected mode dispatches every exception and IRQ through a single
//! Rust entry point (`common_interrupt_entry` in `kernel::arch::x86::handlers`),
//! but the CPU only ever calls a *fixed* address per vector, and a handful of
//! exceptions push a hardware error code onto the stack before doing so while
//! the rest don't. This macro emits the 48 asm trampolines (one per exception
//! 0..=31 and IRQ 0..=15) that normalize that stack shape, save the general
//! registers in the order `CPUState` expects, and call the common entry with
//! the vector number and frame pointer as plain cdecl arguments -- mirroring
//! the original kernel's 48 distinct, non-shared interrupt handlers rather
//! than threading the vector through a second shared label, which would leave
//! an extra word wedged inside the saved-register region.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};

/// Exceptions that push a hardware error code before the CPU jumps to the
/// handler (all within the 0x00-0x13 trap-gate range the kernel installs).
const HAS_ERROR_CODE: [u8; 6] = [8, 10, 11, 12, 13, 17];

#[proc_macro]
pub fn generate_isr_stubs(_input: TokenStream) -> TokenStream {
    let mut asm_lines: Vec<String> = Vec::new();
    let mut extern_decls: Vec<TokenStream2> = Vec::new();
    let mut table_entries: Vec<TokenStream2> = Vec::new();

    for vector in 0u8..32 {
        let name = format_ident!("isr{}", vector);
        push_stub(&mut asm_lines, &name.to_string(), vector, HAS_ERROR_CODE.contains(&vector));
        extern_decls.push(quote! { fn #name(); });
        table_entries.push(quote! { #name });
    }

    for irq in 0u8..16 {
        let name = format_ident!("irq{}", irq);
        push_stub(&mut asm_lines, &name.to_string(), 0x20 + irq, false);
        extern_decls.push(quote! { fn #name(); });
        table_entries.push(quote! { #name });
    }

    let asm_src = asm_lines.join("\n");

    let expanded = quote! {
        core::arch::global_asm!(#asm_src);

        unsafe extern "C" {
            #(#extern_decls)*
        }

        /// Address of the asm trampoline for each of the 48 vectors the
        /// kernel installs gates for, in vector order (0..32 exceptions,
        /// then 0x20..0x30 IRQs).
        pub static ISR_STUB_TABLE: [unsafe extern "C" fn(); 48] = [
            #(#table_entries),*
        ];
    };

    expanded.into()
}

/// Emits one trampoline. After the register pushes below, memory from `esp`
/// upward reads `eax, ebx, ecx, edx, esi, edi, ebp, error, eip, cs, eflags`,
/// which is exactly the field order of `CPUState` -- the pointer handed to
/// `common_interrupt_entry` is valid as a `*mut CPUState` as-is.
fn push_stub(asm_lines: &mut Vec<String>, label: &str, vector: u8, has_error_code: bool) {
    asm_lines.push(format!(".global {label}"));
    asm_lines.push(format!("{label}:"));
    if !has_error_code {
        asm_lines.push("    push 0".to_string());
    }
    asm_lines.push("    push ebp".to_string());
    asm_lines.push("    push edi".to_string());
    asm_lines.push("    push esi".to_string());
    asm_lines.push("    push edx".to_string());
    asm_lines.push("    push ecx".to_string());
    asm_lines.push("    push ebx".to_string());
    asm_lines.push("    push eax".to_string());
    asm_lines.push("    push esp".to_string());
    asm_lines.push(format!("    push {vector}"));
    asm_lines.push("    call common_interrupt_entry".to_string());
    // common_interrupt_entry returns (possibly switched) new esp in eax.
    asm_lines.push("    add esp, 8".to_string());
    asm_lines.push("    mov esp, eax".to_string());
    asm_lines.push("    pop eax".to_string());
    asm_lines.push("    pop ebx".to_string());
    asm_lines.push("    pop ecx".to_string());
    asm_lines.push("    pop edx".to_string());
    asm_lines.push("    pop esi".to_string());
    asm_lines.push("    pop edi".to_string());
    asm_lines.push("    pop ebp".to_string());
    asm_lines.push("    add esp, 4".to_string());
    asm_lines.push("    iretd".to_string());
}
